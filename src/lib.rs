pub mod cache;
pub mod error;
pub mod extract;
pub mod models;
pub mod persistence;
pub mod routes;
pub mod validation;

use worker::{Context, Env, Request, Response, Result, event};

#[event(fetch)]
async fn fetch(req: Request, env: Env, ctx: Context) -> Result<Response> {
    routes::handle(req, env, ctx).await
}
