//! # HTTP Surface
//!
//! Two routes:
//! - `GET /` renders the input form.
//! - `POST /predict` turns the submitted form into a prediction.
//!
//! Every outcome of `/predict` is answered with `200 OK`. Failures render the
//! error view and are logged with their full source chain and a backtrace; the
//! server keeps running.

use axum::Router;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::{get, post};
use log::{error, info};
use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::iter;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

use crate::context::ServingContext;
use crate::render::{render_error, render_form, render_result};
use crate::vector::{FormPairs, collect_fields};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP server terminated: {0}")]
    Io(#[from] std::io::Error),
}

/// Router state. Cloned into every request; the clone only bumps reference counts.
#[derive(Debug, Clone)]
pub struct AppState {
    context: Arc<ServingContext>,
    title: Arc<str>,
}

impl AppState {
    pub fn new(context: ServingContext, title: &str) -> Self {
        Self {
            context: Arc::new(context),
            title: Arc::from(title),
        }
    }

    pub fn context(&self) -> &ServingContext {
        &self.context
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .with_state(state)
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_form(&state.title, state.context.schema()))
}

pub async fn predict(
    State(state): State<AppState>,
    form: Result<Form<FormPairs>, FormRejection>,
) -> Html<String> {
    let fields = match form {
        Ok(Form(pairs)) => collect_fields(pairs),
        Err(rejection) => {
            let message = report_failure(&rejection);
            return Html(render_error(&state.title, &message));
        }
    };

    match state.context.predict(&fields) {
        Ok(inference) => Html(render_result(
            &state.title,
            &inference,
            state.context.importances(),
        )),
        Err(e) => {
            let message = report_failure(&e);
            Html(render_error(&state.title, &message))
        }
    }
}

/// Logs an error with its cause chain and a backtrace and returns the text
/// shown to the user.
fn report_failure(err: &(dyn StdError + 'static)) -> String {
    let backtrace = Backtrace::force_capture();
    error!(
        "Prediction request failed: {}\nBacktrace:\n{backtrace}",
        error_chain(err).join(": caused by: ")
    );
    err.to_string()
}

/// The error followed by each of its sources, outermost first.
fn error_chain(err: &(dyn StdError + 'static)) -> Vec<String> {
    iter::successors(Some(err), |&e| e.source())
        .map(ToString::to_string)
        .collect()
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), ServeError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
