//! Integration tests for grouped tasks occupying a single chain position.

use std::cell::RefCell;
use std::rc::Rc;

use rollchain::{AutoConfirm, Chain, ChainError, Condition, Params, Task};

type Log = Rc<RefCell<Vec<String>>>;

fn tracked(name: &'static str, log: &Log) -> Task {
    let fwd = Rc::clone(log);
    let bwd = Rc::clone(log);
    Task::new(
        name,
        move |_| {
            fwd.borrow_mut().push(format!("do {name}"));
            Ok(())
        },
        move |_| {
            bwd.borrow_mut().push(format!("undo {name}"));
            Ok(())
        },
    )
}

fn failing(name: &'static str, log: &Log) -> Task {
    let fwd = Rc::clone(log);
    let bwd = Rc::clone(log);
    Task::new(
        name,
        move |_| {
            fwd.borrow_mut().push(format!("do {name}"));
            Err("some error!".into())
        },
        move |_| {
            bwd.borrow_mut().push(format!("undo {name}"));
            Ok(())
        },
    )
}

fn failing_compensation(name: &'static str, log: &Log) -> Task {
    let fwd = Rc::clone(log);
    let bwd = Rc::clone(log);
    Task::new(
        name,
        move |_| {
            fwd.borrow_mut().push(format!("do {name}"));
            Ok(())
        },
        move |_| {
            bwd.borrow_mut().push(format!("undo {name}"));
            Err(format!("cannot undo {name}").into())
        },
    )
}

#[test]
fn group_runs_members_in_order_as_one_position() -> anyhow::Result<()> {
    let log = Log::default();
    let group = Task::group(
        "bundle",
        [tracked("a", &log), tracked("b", &log), tracked("c", &log)],
    );
    let mut chain = tracked("before", &log).then(group).then(tracked("after", &log));

    let (result, audit_log) = chain.exec_with_audit(&mut Params::new());
    result?;

    assert_eq!(chain.len(), 3);
    assert_eq!(audit_log.forward(), ["before", "a", "b", "c", "after"]);
    Ok(())
}

#[test]
fn failing_member_stops_group_and_compensates_completed_members() {
    let log = Log::default();
    let group = Task::group(
        "bundle",
        [
            tracked("sub1", &log),
            failing("sub2", &log),
            tracked("sub3", &log),
        ],
    );
    let mut chain = tracked("head", &log)
        .then(group)
        .with_confirmation(AutoConfirm::yes());

    let (result, audit_log) = chain.exec_with_audit(&mut Params::new());

    let err = result.expect_err("sub2 fails");
    assert!(matches!(err, ChainError::Work { ref task, .. } if task == "sub2"));
    assert_eq!(audit_log.forward(), ["head", "sub1", "sub2"]);
    assert_eq!(audit_log.compensated(), ["sub1", "head"]);
    assert_eq!(
        *log.borrow(),
        ["do head", "do sub1", "do sub2", "undo sub1", "undo head"]
    );
}

#[test]
fn group_compensates_members_in_declaration_order() {
    let log = Log::default();
    let group = Task::group("bundle", [tracked("a", &log), tracked("b", &log)]);
    let mut chain = group
        .then(failing("boom", &log))
        .with_confirmation(AutoConfirm::yes());

    let _ = chain.exec(&mut Params::new());

    assert_eq!(
        *log.borrow(),
        ["do a", "do b", "do boom", "undo boom", "undo a", "undo b"]
    );
}

#[test]
fn member_compensation_failure_stops_rollback_at_the_group() {
    let log = Log::default();
    let group = Task::group(
        "bundle",
        [
            failing_compensation("a", &log),
            tracked("b", &log),
        ],
    );
    let mut chain = tracked("head", &log)
        .then(group)
        .then(failing("boom", &log))
        .with_auto_response("y");
    let mut params = Params::new();

    let err = chain.exec(&mut params).expect_err("rollback fails");

    assert!(matches!(err, ChainError::Compensation { ref task, .. } if task == "a"));
    assert!(!log.borrow().contains(&"undo b".to_string()));
    assert!(!log.borrow().contains(&"undo head".to_string()));
    assert_eq!(
        params.last_error().and_then(ChainError::task),
        Some("boom")
    );
}

#[test]
fn group_condition_is_checked_before_any_member_runs() {
    let log = Log::default();
    let group = Task::group("bundle", [tracked("a", &log), tracked("b", &log)])
        .with_condition(Condition::present("ticket"));
    let mut chain = tracked("head", &log)
        .then(group)
        .with_auto_response("y");

    let err = chain.exec(&mut Params::new()).expect_err("ticket missing");

    assert!(matches!(err, ChainError::Validation { ref task, .. } if task == "bundle"));
    assert_eq!(*log.borrow(), ["do head", "undo head"]);
}

#[test]
fn member_condition_failure_rolls_back_the_group() {
    let log = Log::default();
    let group = Task::group(
        "bundle",
        [
            tracked("a", &log),
            tracked("b", &log).with_condition(Condition::present("ticket")),
        ],
    );
    let mut chain = Chain::new(group).with_auto_response("y");

    let err = chain.exec(&mut Params::new()).expect_err("ticket missing");

    assert!(matches!(err, ChainError::Validation { ref task, .. } if task == "b"));
    assert_eq!(*log.borrow(), ["do a", "undo a"]);
}

#[test]
fn forced_rollback_compensates_every_member() -> anyhow::Result<()> {
    let log = Log::default();
    let group = Task::group("bundle", [tracked("a", &log), tracked("b", &log)]);
    let mut chain = tracked("head", &log).then(group).with_auto_response("y");

    chain.rollback(&mut Params::new())?;

    assert_eq!(*log.borrow(), ["undo a", "undo b", "undo head"]);
    Ok(())
}

#[test]
fn nested_group_compensates_only_what_ran() {
    let log = Log::default();
    let inner = Task::group("inner", [tracked("x", &log), failing("y", &log)]);
    let outer = Task::group("outer", [tracked("a", &log), inner, tracked("b", &log)]);
    let mut chain = Chain::new(outer).with_confirmation(AutoConfirm::yes());

    let _ = chain.exec(&mut Params::new());

    assert_eq!(
        *log.borrow(),
        ["do a", "do x", "do y", "undo a", "undo x"]
    );
}
