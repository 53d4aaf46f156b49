//! Thread-value methods.
//!
//! `start()` snapshots the wrapped function and argument on the calling
//! thread, spawns an OS thread, and rehydrates them into a fresh
//! evaluator there — an independent evaluator over a cloned environment.
//! The body's result is stored for retrieval through `value()`.

use std::sync::{Arc, Mutex};

use crate::env::Environment;
use crate::errors::{ErrorObj, EvalResult, Flow};
use crate::evaluator::Evaluator;
use crate::io::StdPrint;
use crate::object::{boolean_obj, null_obj, ObjectKind, ObjectRef};
use crate::snapshot::{
    rehydrate_function, rehydrate_value, snapshot_function, snapshot_value, SnapshotTracker,
    SnapshotValue,
};
use crate::token::{Token, TokenKind};

use super::{expect_method_args, wrong_receiver, TypeTable};

pub fn table() -> TypeTable {
    let mut table = TypeTable::default();
    table.method("start", "", "null", start);
    table.method("detach", "", "null", detach);
    table.method("join", "", "null", join);
    table.method("joinable", "", "bool", joinable);
    table.method("value", "", "all", value);
    table
}

fn start(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("start", &values, &[0])?;

    let (function, argument, result_slot, already_started) = {
        let guard = receiver.borrow();
        match &guard.kind {
            ObjectKind::Thread(thread) => (
                thread.function.clone(),
                thread.argument.clone(),
                thread.result.clone(),
                thread.handle.is_some(),
            ),
            _ => return Err(wrong_receiver("start", "Thread", receiver)),
        }
    };
    if already_started {
        return Err(Flow::Error(ErrorObj::type_err(
            "start: cannot start thread twice",
        )));
    }

    let mut tracker = SnapshotTracker::default();
    let function_snapshot = snapshot_function(&function, &mut tracker);
    let argument_snapshot = argument.map(|argument| snapshot_value(&argument, &mut tracker));

    let handle = std::thread::spawn(move || {
        let mut writer = StdPrint;
        let mut evaluator = Evaluator::new(&mut writer);
        let root = Environment::new(None);
        let function = rehydrate_function(&function_snapshot, &root);
        let arguments = match &argument_snapshot {
            Some(snapshot) => vec![rehydrate_value(snapshot, &root)],
            None => vec![],
        };
        let call_token = Token::synthetic(TokenKind::Ident, "thread");
        let outcome = evaluator.eval_function_with_values(&function, arguments, &call_token);

        let result = match outcome {
            Ok(result) => snapshot_value(&result, &mut SnapshotTracker::default()),
            Err(Flow::Return(result)) => {
                snapshot_value(&result, &mut SnapshotTracker::default())
            }
            Err(Flow::Error(error)) => SnapshotValue::Error {
                kind: error.kind,
                message: error.message,
            },
            Err(_) => SnapshotValue::Null,
        };
        if let Ok(mut slot) = result_slot.lock() {
            *slot = Some(result);
        }
    });

    if let ObjectKind::Thread(thread) = &mut receiver.borrow_mut().kind {
        thread.handle = Some(handle);
    }
    Ok(null_obj())
}

fn detach(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("detach", &values, &[0])?;
    match &mut receiver.borrow_mut().kind {
        ObjectKind::Thread(thread) => {
            thread.handle = None;
            Ok(null_obj())
        }
        _ => Err(wrong_receiver("detach", "Thread", receiver)),
    }
}

fn join(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("join", &values, &[0])?;
    let handle = match &mut receiver.borrow_mut().kind {
        ObjectKind::Thread(thread) => thread.handle.take(),
        _ => return Err(wrong_receiver("join", "Thread", receiver)),
    };
    if let Some(handle) = handle {
        if handle.join().is_err() {
            return Err(Flow::Error(ErrorObj::os_err("join: thread panicked")));
        }
    }
    Ok(null_obj())
}

fn joinable(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("joinable", &values, &[0])?;
    match &receiver.borrow().kind {
        ObjectKind::Thread(thread) => Ok(boolean_obj(thread.handle.is_some())),
        _ => Err(wrong_receiver("joinable", "Thread", receiver)),
    }
}

/// The function's stored return value; null while the thread is still
/// running.
fn value(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("value", &values, &[0])?;
    let result_slot: Arc<Mutex<Option<SnapshotValue>>> = match &receiver.borrow().kind {
        ObjectKind::Thread(thread) => thread.result.clone(),
        _ => return Err(wrong_receiver("value", "Thread", receiver)),
    };
    let snapshot = match result_slot.lock() {
        Ok(slot) => slot.clone(),
        Err(_) => None,
    };
    match snapshot {
        Some(snapshot) => {
            let scratch = Environment::new(None);
            Ok(rehydrate_value(&snapshot, &scratch))
        }
        None => Ok(null_obj()),
    }
}
