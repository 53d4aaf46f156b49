//! File-stream methods for io values.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use crate::errors::{ErrorObj, EvalResult, Flow};
use crate::evaluator::Evaluator;
use crate::object::{
    alloc, boolean_obj, integer_obj, null_obj, string_obj, ObjectKind, ObjectRef, OpenMode,
};
use crate::token::Token;

use super::{expect_method_args, wrong_receiver, TypeTable};

pub fn table() -> TypeTable {
    let mut table = TypeTable::default();
    table.method("open", "str, str", "io", open);
    table.method("is_open", "", "bool", is_open);
    table.method("close", "", "null", close);
    table.method("read", "", "str", read);
    table.method("read_line", "", "str", read_line);
    table.method("read_lines", "", "[str]", read_lines);
    table.method("seek", "int, int", "null", seek);
    table.method("tell", "", "int", tell);
    table.method("write", "str", "null", write);
    table.method("flush", "", "null", flush);
    table
}

/// Opens a file for the given mode; `None` when the open fails, which the
/// io value reports through `is_open()`.
#[must_use]
pub fn open_file(path: &str, mode: OpenMode) -> Option<File> {
    match mode {
        OpenMode::Read | OpenMode::ReadBinary => File::open(path).ok(),
        OpenMode::Write | OpenMode::WriteBinary => File::create(path).ok(),
        OpenMode::Append => OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .ok(),
    }
}

fn with_io<T>(
    receiver: &ObjectRef,
    name: &str,
    operate: impl FnOnce(&mut crate::object::IoObj) -> Result<T, Flow>,
) -> Result<T, Flow> {
    let mut guard = receiver.borrow_mut();
    match &mut guard.kind {
        ObjectKind::IOObject(io) => operate(io),
        _ => Err(wrong_receiver(name, "IOObject", receiver)),
    }
}

fn not_open(name: &str) -> Flow {
    Flow::Error(ErrorObj::os_err(format!("{name}: stream is not open")))
}

fn open(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("open", &values, &[1, 2])?;
    let path = match &values[0].borrow().kind {
        ObjectKind::Str(text) => text.clone(),
        _ => {
            return Err(Flow::Error(ErrorObj::type_err(
                "open: expected argument 1 of type str",
            )))
        }
    };
    let mode = match values.get(1) {
        None => OpenMode::Read,
        Some(value) => match &value.borrow().kind {
            ObjectKind::Str(text) => OpenMode::parse(text).ok_or_else(|| {
                Flow::Error(ErrorObj::type_err(format!(
                    "open: openmode has to be one of r,rb,w,wb,a, got {text}"
                )))
            })?,
            _ => {
                return Err(Flow::Error(ErrorObj::type_err(
                    "open: expected argument 2 of type str",
                )))
            }
        },
    };
    with_io(receiver, "open", |io| {
        io.path = path.clone();
        io.mode = mode;
        io.file = open_file(&path, mode);
        Ok(())
    })?;
    Ok(receiver.clone())
}

fn is_open(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("is_open", &values, &[0])?;
    let open = with_io(receiver, "is_open", |io| Ok(io.file.is_some()))?;
    Ok(boolean_obj(open))
}

fn close(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("close", &values, &[0])?;
    with_io(receiver, "close", |io| {
        io.file = None;
        Ok(())
    })?;
    Ok(null_obj())
}

/// Reads the remaining stream content.
fn read(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("read", &values, &[0])?;
    let content = with_io(receiver, "read", |io| {
        let Some(file) = io.file.as_mut() else {
            return Err(not_open("read"));
        };
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|error| Flow::Error(ErrorObj::os_err(format!("read: {error}"))))?;
        Ok(content)
    })?;
    Ok(string_obj(content))
}

fn read_line_from(file: &mut File) -> Result<String, Flow> {
    let mut line = Vec::new();
    let mut byte = [0_u8; 1];
    loop {
        match file.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                if byte[0] == b'\n' {
                    break;
                }
                line.push(byte[0]);
            }
            Err(error) => {
                return Err(Flow::Error(ErrorObj::os_err(format!("read_line: {error}"))))
            }
        }
    }
    Ok(String::from_utf8_lossy(&line).into_owned())
}

fn read_line(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("read_line", &values, &[0])?;
    let line = with_io(receiver, "read_line", |io| {
        let Some(file) = io.file.as_mut() else {
            return Err(not_open("read_line"));
        };
        read_line_from(file)
    })?;
    Ok(string_obj(line))
}

fn read_lines(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("read_lines", &values, &[0])?;
    let content = with_io(receiver, "read_lines", |io| {
        let Some(file) = io.file.as_mut() else {
            return Err(not_open("read_lines"));
        };
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|error| Flow::Error(ErrorObj::os_err(format!("read_lines: {error}"))))?;
        Ok(content)
    })?;
    let lines = content
        .lines()
        .map(|line| string_obj(line.to_string()))
        .collect();
    Ok(alloc(ObjectKind::Array(lines)))
}

/// `seek(offset, whence)` with whence 0 = start, 1 = current, 2 = end.
fn seek(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("seek", &values, &[1, 2])?;
    let offset = match &values[0].borrow().kind {
        ObjectKind::Integer(value) => *value,
        _ => {
            return Err(Flow::Error(ErrorObj::type_err(
                "seek: expected argument 1 of type int",
            )))
        }
    };
    let whence = match values.get(1) {
        None => 0,
        Some(value) => match &value.borrow().kind {
            ObjectKind::Integer(value) => *value,
            _ => {
                return Err(Flow::Error(ErrorObj::type_err(
                    "seek: expected argument 2 of type int",
                )))
            }
        },
    };
    with_io(receiver, "seek", |io| {
        let Some(file) = io.file.as_mut() else {
            return Err(not_open("seek"));
        };
        let position = match whence {
            0 => SeekFrom::Start(offset.max(0) as u64),
            1 => SeekFrom::Current(offset),
            2 => SeekFrom::End(offset),
            _ => {
                return Err(Flow::Error(ErrorObj::value_err(
                    "seek: whence must be 0, 1 or 2",
                )))
            }
        };
        file.seek(position)
            .map_err(|error| Flow::Error(ErrorObj::os_err(format!("seek: {error}"))))?;
        Ok(())
    })?;
    Ok(null_obj())
}

fn tell(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("tell", &values, &[0])?;
    let position = with_io(receiver, "tell", |io| {
        let Some(file) = io.file.as_mut() else {
            return Err(not_open("tell"));
        };
        file.stream_position()
            .map_err(|error| Flow::Error(ErrorObj::os_err(format!("tell: {error}"))))
    })?;
    Ok(integer_obj(position as i64))
}

fn write(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("write", &values, &[1])?;
    let content = match &values[0].borrow().kind {
        ObjectKind::Str(text) => text.clone(),
        _ => {
            return Err(Flow::Error(ErrorObj::type_err(
                "write: expected argument 1 of type str",
            )))
        }
    };
    with_io(receiver, "write", |io| {
        let Some(file) = io.file.as_mut() else {
            return Err(not_open("write"));
        };
        file.write_all(content.as_bytes())
            .map_err(|error| Flow::Error(ErrorObj::os_err(format!("write: {error}"))))
    })?;
    Ok(null_obj())
}

fn flush(
    _evaluator: &mut Evaluator<'_>,
    receiver: &ObjectRef,
    values: Vec<ObjectRef>,
    _token: &Token,
) -> EvalResult {
    expect_method_args("flush", &values, &[0])?;
    with_io(receiver, "flush", |io| {
        let Some(file) = io.file.as_mut() else {
            return Err(not_open("flush"));
        };
        file.flush()
            .map_err(|error| Flow::Error(ErrorObj::os_err(format!("flush: {error}"))))
    })?;
    Ok(null_obj())
}
