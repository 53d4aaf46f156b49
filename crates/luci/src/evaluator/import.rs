//! `import a::b::c` resolution: builtin modules first, then `.luci` files
//! resolved against the working directory, with `Defined` placeholder
//! modules holding the hierarchy together.

use crate::ast::ImportStatement;
use crate::env::{EnvRef, Environment};
use crate::errors::{ErrorKind, ErrorObj, EvalResult, Flow};
use crate::object::{alloc, null_obj, ModuleObj, ModuleState, ObjectKind, ObjectRef};
use crate::parser::parse_source;

use super::Evaluator;

impl Evaluator<'_> {
    pub(crate) fn eval_import(&mut self, statement: &ImportStatement, env: &EnvRef) -> EvalResult {
        let path = &statement.path;
        let joined = path.join("::");
        let local_name = path.last().cloned().unwrap_or_default();

        let import_error = |message: String| {
            Flow::Error(ErrorObj::with_token(
                ErrorKind::ImportError,
                message,
                statement.token.clone(),
            ))
        };

        // builtin modules resolve by walking the submodule chain through
        // their environments
        let (module, source) = if let Some(builtin) = self.registry.modules.get(path[0].as_str()) {
            let mut module = builtin.clone();
            for segment in &path[1..] {
                let submodule = {
                    let guard = module.borrow();
                    let ObjectKind::Module(module_obj) = &guard.kind else {
                        return Err(import_error(format!(
                            "import: {joined} failed to import, builtin module not found"
                        )));
                    };
                    let found = module_obj.env.borrow().get(segment).ok();
                    found
                };
                match submodule {
                    Some(inner) if matches!(inner.borrow().kind, ObjectKind::Module(_)) => {
                        module = inner;
                    }
                    _ => {
                        return Err(import_error(format!(
                            "import: {joined} failed to import, builtin module not found"
                        )))
                    }
                }
            }
            (module, None)
        } else {
            let mut file_path = std::env::current_dir().unwrap_or_default();
            for segment in &path[..path.len() - 1] {
                file_path.push(segment);
            }
            file_path.push(format!("{local_name}.luci"));

            let Ok(text) = std::fs::read_to_string(&file_path) else {
                return Err(import_error(format!(
                    "import: {joined} failed to import, file {} not found",
                    file_path.display()
                )));
            };

            let module = alloc(ObjectKind::Module(ModuleObj {
                state: ModuleState::Unknown,
                env: Environment::new(None),
                file_name: file_path.display().to_string(),
            }));
            (module, Some(text))
        };

        // build Defined placeholders along the path so submodules nest
        let mut target_env = env.clone();
        for segment in &path[..path.len().saturating_sub(1)] {
            let existing = target_env.borrow().get(segment).ok();
            match existing {
                Some(value) => {
                    let inner_env = {
                        let guard = value.borrow();
                        match &guard.kind {
                            ObjectKind::Module(module_obj) => Some(module_obj.env.clone()),
                            _ => None,
                        }
                    };
                    let Some(inner_env) = inner_env else {
                        return Err(import_error(format!(
                            "import: {joined} failed to import, name {segment} already used"
                        )));
                    };
                    target_env = inner_env;
                }
                None => {
                    let placeholder_env = Environment::new(None);
                    let placeholder = alloc(ObjectKind::Module(ModuleObj {
                        state: ModuleState::Defined,
                        env: placeholder_env.clone(),
                        file_name: String::new(),
                    }));
                    target_env
                        .borrow_mut()
                        .add(segment, placeholder, false, None)
                        .map_err(|error| Flow::Error(error.stamped(&statement.token)))?;
                    target_env = placeholder_env;
                }
            }
        }

        let existing = target_env.borrow().get(&local_name).ok();
        if let Some(existing) = existing {
            let state = {
                let guard = existing.borrow();
                match &guard.kind {
                    ObjectKind::Module(module_obj) => Some(module_obj.state),
                    _ => None,
                }
            };
            let Some(state) = state else {
                return Err(import_error(format!(
                    "import: {joined} failed to import, name {local_name} already used"
                )));
            };
            match state {
                ModuleState::Unknown => {
                    return Err(import_error(format!("import: {joined} in unknown state")))
                }
                // re-importing a loaded module is a no-op
                ModuleState::Loaded => return Ok(null_obj()),
                ModuleState::Defined => {
                    let (module_env, file_name) = {
                        let guard = module.borrow();
                        match &guard.kind {
                            ObjectKind::Module(module_obj) => {
                                (module_obj.env.clone(), module_obj.file_name.clone())
                            }
                            _ => unreachable!("module allocated above"),
                        }
                    };
                    if let Some(text) = source {
                        self.run_source_in_env(&text, &file_name, &module_env)?;
                    }
                    if let ObjectKind::Module(module_obj) = &mut module.borrow_mut().kind {
                        module_obj.state = ModuleState::Loaded;
                    }

                    // fold previously loaded submodules into the real module
                    self.transfer_submodules(&existing, &module, &joined, &statement.token)?;
                    target_env
                        .borrow_mut()
                        .set(&local_name, module)
                        .map_err(|error| Flow::Error(error.stamped(&statement.token)))?;
                    return Ok(null_obj());
                }
            }
        }

        let needs_run = {
            let guard = module.borrow();
            matches!(
                &guard.kind,
                ObjectKind::Module(module_obj) if module_obj.state == ModuleState::Unknown
            )
        };
        if needs_run {
            let (module_env, file_name) = {
                let guard = module.borrow();
                match &guard.kind {
                    ObjectKind::Module(module_obj) => {
                        (module_obj.env.clone(), module_obj.file_name.clone())
                    }
                    _ => unreachable!("module allocated above"),
                }
            };
            if let Some(text) = source {
                self.run_source_in_env(&text, &file_name, &module_env)?;
            }
            if let ObjectKind::Module(module_obj) = &mut module.borrow_mut().kind {
                module_obj.state = ModuleState::Loaded;
            }
        }

        target_env
            .borrow_mut()
            .add(&local_name, module, false, None)
            .map_err(|error| Flow::Error(error.stamped(&statement.token)))?;
        Ok(null_obj())
    }

    /// Moves submodules of a `Defined` placeholder into the freshly loaded
    /// module; non-module bindings on either side are conflicts.
    fn transfer_submodules(
        &mut self,
        placeholder: &ObjectRef,
        module: &ObjectRef,
        joined: &str,
        token: &crate::token::Token,
    ) -> Result<(), Flow> {
        let placeholder_env = match &placeholder.borrow().kind {
            ObjectKind::Module(module_obj) => module_obj.env.clone(),
            _ => return Ok(()),
        };
        let module_env = match &module.borrow().kind {
            ObjectKind::Module(module_obj) => module_obj.env.clone(),
            _ => return Ok(()),
        };

        let names: Vec<String> = placeholder_env.borrow().store.keys().cloned().collect();
        for name in names {
            let value = placeholder_env
                .borrow()
                .get(&name)
                .map_err(|error| Flow::Error(error.stamped(token)))?;
            if !matches!(value.borrow().kind, ObjectKind::Module(_)) {
                return Err(Flow::Error(ErrorObj::with_token(
                    ErrorKind::ImportError,
                    format!(
                        "import: {joined} a module definition contains other objects beyond other modules"
                    ),
                    token.clone(),
                )));
            }
            let conflict = module_env.borrow().get(&name).ok();
            match conflict {
                Some(existing) if !matches!(existing.borrow().kind, ObjectKind::Module(_)) => {
                    return Err(Flow::Error(ErrorObj::with_token(
                        ErrorKind::ImportError,
                        format!(
                            "import: {joined} failed, sub module {name} is in conflict with variable/functions defined in module"
                        ),
                        token.clone(),
                    )));
                }
                Some(_) => {
                    module_env
                        .borrow_mut()
                        .set(&name, value)
                        .map_err(|error| Flow::Error(error.stamped(token)))?;
                }
                None => {
                    module_env
                        .borrow_mut()
                        .add(&name, value, false, None)
                        .map_err(|error| Flow::Error(error.stamped(token)))?;
                }
            }
        }
        Ok(())
    }

    /// Lex, parse and evaluate a source text in the given environment;
    /// parse errors surface as a single `SyntaxError`.
    pub(crate) fn run_source_in_env(
        &mut self,
        text: &str,
        file_name: &str,
        env: &EnvRef,
    ) -> EvalResult {
        let (program, errors) = parse_source(text, file_name);
        if !errors.is_empty() {
            let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Err(Flow::Error(ErrorObj::new(
                ErrorKind::SyntaxError,
                format!("run: parsing errors encountered: {}", rendered.join("\n")),
            )));
        }
        self.eval_program(&program, env)
    }
}
