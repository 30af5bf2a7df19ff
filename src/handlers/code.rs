//! Code artifacts (`.rhai`), run in an embedded rhai interpreter.
//!
//! A script exposes entry points as functions of `(req, res, session)`,
//! named after the lower-case request method, plus a catch-all named `all`.
//! The page is bound as `this`:
//!
//! ```text
//! fn get(req, res, session) {
//!     this.user = req.query.name;
//!     if req.query.name == () {
//!         res.redirect("/login");
//!         return true;            // stop the cascade
//!     }
//! }
//! ```
//!
//! # Design Decisions
//! - Compiled on every call so edits apply without a restart
//! - Runs on the blocking pool; page, request and session cross as JSON
//! - A boolean return value is the stop signal, anything else continues
//! - Finalizing the response twice is a script error

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rhai::{CallFnOptions, Dynamic, Engine, EvalAltResult, Position, Scope, AST};
use serde_json::Value;

use crate::cascade::context::ResponseDraft;
use crate::cascade::page::PageState;
use crate::config::ScriptConfig;
use crate::error::ScriptError;
use crate::handlers::{Contribution, HandlerContext};
use crate::routing::Artifact;

/// Entry point used when no method-specific one exists.
pub const CATCH_ALL: &str = "all";

/// Entry points take `(req, res, session)`.
const ENTRY_ARITY: usize = 3;

/// Response handle exposed to scripts as `res`.
#[derive(Debug, Clone)]
pub struct ResponseHandle(Arc<Mutex<ResponseDraft>>);

impl ResponseHandle {
    fn new(draft: ResponseDraft) -> Self {
        Self(Arc::new(Mutex::new(draft)))
    }

    fn with<T>(&self, f: impl FnOnce(&mut ResponseDraft) -> T) -> Result<T, Box<EvalAltResult>> {
        let mut draft = self
            .0
            .lock()
            .map_err(|_| runtime_error("response lock poisoned"))?;
        Ok(f(&mut draft))
    }

    fn finalize(&self, f: impl FnOnce(&mut ResponseDraft)) -> Result<(), Box<EvalAltResult>> {
        self.with(|draft| {
            if draft.finalized {
                return Err(runtime_error("response already sent"));
            }
            f(draft);
            draft.finalized = true;
            Ok(())
        })?
    }

    /// Change the draft unless the response has already been sent.
    fn amend(&self, f: impl FnOnce(&mut ResponseDraft)) -> Result<(), Box<EvalAltResult>> {
        self.with(|draft| {
            if draft.finalized {
                tracing::debug!("Ignoring write to a response that was already sent");
            } else {
                f(draft);
            }
        })
    }

    fn status(&mut self, code: i64) -> Result<(), Box<EvalAltResult>> {
        let code = valid_status(code)?;
        self.amend(|draft| draft.status = Some(code))
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), Box<EvalAltResult>> {
        self.amend(|draft| draft.set_header(name, value))
    }

    fn content_type(&mut self, value: &str) -> Result<(), Box<EvalAltResult>> {
        self.amend(|draft| draft.content_type = Some(value.to_string()))
    }

    fn send(&mut self, body: &str) -> Result<(), Box<EvalAltResult>> {
        self.finalize(|draft| draft.body = Some(body.to_string()))
    }

    fn json(&mut self, value: Dynamic) -> Result<(), Box<EvalAltResult>> {
        let value: Value = rhai::serde::from_dynamic(&value)?;
        let body = serde_json::to_string_pretty(&value)
            .map_err(|e| runtime_error(format!("value is not JSON: {e}")))?;
        self.finalize(|draft| {
            draft.content_type = Some("application/json".to_string());
            draft.body = Some(body);
        })
    }

    fn redirect(&mut self, code: i64, location: &str) -> Result<(), Box<EvalAltResult>> {
        let code = valid_status(code)?;
        self.finalize(|draft| {
            draft.status = Some(code);
            draft.set_header("location", location);
        })
    }

    fn end(&mut self) -> Result<(), Box<EvalAltResult>> {
        self.finalize(|_| {})
    }

    fn is_finalized(&mut self) -> Result<bool, Box<EvalAltResult>> {
        self.with(|draft| draft.finalized)
    }

    fn into_draft(self) -> Result<ResponseDraft, Box<EvalAltResult>> {
        self.with(|draft| draft.clone())
    }
}

fn valid_status(code: i64) -> Result<u16, Box<EvalAltResult>> {
    match u16::try_from(code) {
        Ok(code) if (100..=999).contains(&code) => Ok(code),
        _ => Err(runtime_error(format!("invalid status code {code}"))),
    }
}

fn runtime_error(message: impl Into<String>) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(message.into().into(), Position::NONE).into()
}

fn build_engine(limits: &ScriptConfig, script: &str) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(limits.max_operations);
    engine.set_max_call_levels(limits.max_call_levels);

    let source = script.to_string();
    engine.on_print(move |text| tracing::info!(script = %source, "{text}"));
    let source = script.to_string();
    engine.on_debug(move |text, _, pos| tracing::debug!(script = %source, position = %pos, "{text}"));

    engine
        .register_type_with_name::<ResponseHandle>("Response")
        .register_fn("status", ResponseHandle::status)
        .register_fn("set_header", ResponseHandle::set_header)
        .register_fn("content_type", ResponseHandle::content_type)
        .register_fn("send", ResponseHandle::send)
        .register_fn("json", ResponseHandle::json)
        .register_fn("redirect", |res: &mut ResponseHandle, location: &str| {
            res.redirect(302, location)
        })
        .register_fn("redirect", ResponseHandle::redirect)
        .register_fn("end", ResponseHandle::end)
        .register_get("finalized", ResponseHandle::is_finalized);

    engine
}

/// Pick the entry point for `method`, falling back to the catch-all.
pub fn entry_point(ast: &AST, method: &str) -> Option<String> {
    let defines = |name: &str| {
        ast.iter_functions()
            .any(|f| f.name == name && f.params.len() == ENTRY_ARITY)
    };

    let method = method.to_lowercase();
    if defines(&method) {
        Some(method)
    } else if defines(CATCH_ALL) {
        Some(CATCH_ALL.to_string())
    } else {
        None
    }
}

/// Everything a script run needs, owned so it can cross to the blocking pool.
struct ScriptJob {
    path: PathBuf,
    source: String,
    method: String,
    request: Value,
    session: Value,
    page: Value,
    response: ResponseDraft,
    limits: ScriptConfig,
}

enum ScriptOutcome {
    NotHandled,
    Ran {
        page: PageState,
        response: ResponseDraft,
        stop: bool,
    },
}

impl ScriptJob {
    fn execute(self) -> Result<ScriptOutcome, ScriptError> {
        let label = self.path.display().to_string();
        let engine = build_engine(&self.limits, &label);

        let ast = engine.compile(&self.source).map_err(|e| ScriptError::Compile {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let Some(entry) = entry_point(&ast, &self.method) else {
            return Ok(ScriptOutcome::NotHandled);
        };
        let runtime = |e: Box<EvalAltResult>| ScriptError::Runtime {
            path: self.path.clone(),
            entry: entry.clone(),
            message: e.to_string(),
        };

        let mut this = rhai::serde::to_dynamic(&self.page).map_err(runtime)?;
        let req = rhai::serde::to_dynamic(&self.request).map_err(runtime)?;
        let session = rhai::serde::to_dynamic(&self.session).map_err(runtime)?;
        let res = ResponseHandle::new(self.response);

        let options = CallFnOptions::new().bind_this_ptr(&mut this);
        let result = engine
            .call_fn_with_options::<Dynamic>(
                options,
                &mut Scope::new(),
                &ast,
                &entry,
                (req, res.clone(), session),
            )
            .map_err(runtime)?;
        let stop = result.as_bool().unwrap_or(false);

        let page_error = |message: String| ScriptError::Page {
            path: self.path.clone(),
            message,
        };
        let page: Value = rhai::serde::from_dynamic(&this).map_err(|e| page_error(e.to_string()))?;
        let page = PageState::from_value(page).map_err(|e| page_error(e.to_string()))?;
        let response = res.into_draft().map_err(runtime)?;

        Ok(ScriptOutcome::Ran {
            page,
            response,
            stop,
        })
    }
}

/// Run the script entry point for this request.
pub async fn run(
    artifact: &Artifact,
    cx: &HandlerContext<'_>,
    page: &mut PageState,
    response: &mut ResponseDraft,
) -> Result<Contribution, ScriptError> {
    let source = tokio::fs::read_to_string(&artifact.path)
        .await
        .map_err(|e| ScriptError::Compile {
            path: artifact.path.clone(),
            message: format!("cannot read script: {e}"),
        })?;

    let job = ScriptJob {
        path: artifact.path.clone(),
        source,
        method: cx.request.method.clone(),
        request: cx.request.to_value(),
        session: cx.session.to_value(),
        page: page.to_value(),
        response: response.clone(),
        limits: cx.scripts.clone(),
    };

    let outcome = tokio::task::spawn_blocking(move || job.execute())
        .await
        .map_err(|e| ScriptError::Aborted {
            path: artifact.path.clone(),
            message: e.to_string(),
        })??;

    match outcome {
        ScriptOutcome::NotHandled => {
            tracing::debug!(
                file = %artifact.path.display(),
                method = %cx.request.method,
                "No entry point for method"
            );
            Ok(Contribution::NotHandled)
        }
        ScriptOutcome::Ran {
            page: updated,
            response: written,
            stop,
        } => {
            *page = updated;
            *response = written;
            Ok(Contribution::Code { stop })
        }
    }
}
