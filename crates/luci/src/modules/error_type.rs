//! The `error_type` module: the error taxonomy as integer constants.

use crate::errors::ErrorKind;
use crate::object::{integer_obj, ObjectRef};

use super::{module_value, new_module_env};

#[must_use]
pub fn create_module() -> ObjectRef {
    let env = new_module_env();
    let constants = [
        ("undefined_error", ErrorKind::UndefinedError),
        ("type_error", ErrorKind::TypeError),
        ("const_error", ErrorKind::ConstError),
        ("identifier_not_found", ErrorKind::IdentifierNotFound),
        ("identifier_already_exists", ErrorKind::IdentifierAlreadyExists),
        ("value_error", ErrorKind::ValueError),
        ("key_error", ErrorKind::KeyError),
        ("index_error", ErrorKind::IndexError),
        ("import_error", ErrorKind::ImportError),
        ("syntax_error", ErrorKind::SyntaxError),
        ("os_error", ErrorKind::OsError),
    ];
    for (name, kind) in constants {
        let _ = env
            .borrow_mut()
            .add(name, integer_obj(kind.code()), true, None);
    }
    module_value(env)
}
