//! User CRUD API under `/api`, backed by an in-memory repository.
//!
//! Run with:
//!   RUST_LOG=debug LARVATUS_ENV=development cargo run --example users
//!
//! Try:
//!   curl http://localhost:3000/
//!   curl -X POST http://localhost:3000/api/users -d 'name=ada&role=admin'
//!   curl http://localhost:3000/api/users
//!   curl http://localhost:3000/api/users/1
//!   curl -X PUT http://localhost:3000/api/users/1 \
//!        -H 'content-type: application/json' -d '{"role":"owner"}'
//!   curl -X DELETE http://localhost:3000/api/users/1
//!   curl http://localhost:3000/healthz

use std::sync::Arc;

use larvatus::middleware::Trace;
use larvatus::store::{MemoryRepository, Repository};
use larvatus::view::{Renderer, Templates};
use larvatus::{App, Config, Error, Outcome, Request, Response, Server, Status, health};
use serde_json::json;
use tracing::info;

const INDEX: &str = "<!doctype html>\n<h1>{{ title }}</h1>\n<p>{{ count }} users registered.</p>\n";

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let repository = MemoryRepository::new("users");
    info!(collection = repository.collection(), "repository ready");
    let users: Arc<dyn Repository> = Arc::new(repository);
    let views = Arc::new(Templates::new().template("index", INDEX).set("title", "larvatus"));

    let index_users = Arc::clone(&users);
    let app = App::from_config(&config)
        .layer(Trace)
        .get("/", move |_req, res| {
            let page = views.render("index", &json!({ "count": index_users.all().len() }))?;
            res.html(page);
            res.send();
            Ok(())
        })
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness)
        .group("/api", |api| {
            let (list, show, create, update, remove) = (
                Arc::clone(&users),
                Arc::clone(&users),
                Arc::clone(&users),
                Arc::clone(&users),
                Arc::clone(&users),
            );
            api.get("/users", move |_req, res| {
                res.json(&list.all())?;
                res.send();
                Ok(())
            })
            .get("/users/:id", move |req, res| {
                match id(req).and_then(|id| show.find(id)) {
                    Some(user) => res.json(&user)?,
                    None => not_found(res, "User not found")?,
                }
                res.send();
                Ok(())
            })
            .post("/users", move |req, res| {
                let user_id = create.create(req.form().clone());
                res.set_status(Status::Created);
                res.json(&json!({ "message": "User created", "user_id": user_id }))?;
                res.send();
                Ok(())
            })
            .put("/users/:id", move |req, res| {
                let data = req.form().clone();
                if id(req).is_some_and(|id| update.update(id, data)) {
                    res.json(&json!({ "message": "User updated" }))?;
                } else {
                    not_found(res, "User not found or not updated")?;
                }
                res.send();
                Ok(())
            })
            .delete("/users/:id", move |req, res| {
                if id(req).is_some_and(|id| remove.delete(id)) {
                    res.json(&json!({ "message": "User deleted" }))?;
                } else {
                    not_found(res, "User not found or not deleted")?;
                }
                res.send();
                Ok(())
            })
        });

    Server::bind(config.addr).serve(app).await
}

fn id(req: &Request) -> Option<u64> {
    req.param("id")?.parse().ok()
}

fn not_found(res: &mut Response, message: &str) -> Outcome {
    res.set_status(Status::NotFound);
    res.json(&json!({ "error": message }))
}
