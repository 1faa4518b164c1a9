use std::collections::HashMap;

use axum::http::StatusCode;
use axum_test::TestServer;
use lernboard::{
    auth::hash_password,
    build_server_with_db,
    model::{MockDatabase, Tables},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tower_cookies::Cookie;

#[allow(unused)]
pub const ADMIN_ID: &str = "user-admin";
#[allow(unused)]
pub const TEACHER_ID: &str = "user-teacher";
#[allow(unused)]
pub const STUDENT_ID: &str = "user-student";

/// Demo fixture: an admin, a teacher owning two courses and a student whose
/// recorded progress for `course-1` references a module that no longer exists.
pub fn seed_tables() -> Tables {
    let hash = |pw: &str| hash_password(pw).expect("Unable to hash password");

    serde_json::from_value(json!({
        "users": [
            {
                "id": ADMIN_ID,
                "name": "Ada Admin",
                "email": "admin@lernboard.test",
                "password_hash": hash("admin"),
                "role": "admin",
            },
            {
                "id": TEACHER_ID,
                "name": "Tom Teacher",
                "email": "teacher@lernboard.test",
                "password_hash": hash("teacher"),
                "role": "teacher",
            },
            {
                "id": STUDENT_ID,
                "name": "Sam Student",
                "email": "student@lernboard.test",
                "password_hash": hash("student"),
                "role": "student",
                "enrolled_courses": ["course-1", "course-2"],
                "progress": {
                    "course-1": {
                        "completed_modules": ["module-1", "module-stale"],
                        "percentage": 100,
                    },
                },
            },
        ],
        "courses": [
            {
                "id": "course-1",
                "title": "Intro to Rust",
                "category": "programming",
                "instructor_id": TEACHER_ID,
                "status": "published",
                "modules": [
                    { "id": "module-1", "title": "Ownership" },
                    { "id": "module-2", "title": "Borrowing" },
                ],
                "enrolled_students": 1,
                "average_rating": 4.5,
            },
            {
                "id": "course-2",
                "title": "Async Rust",
                "instructor_id": TEACHER_ID,
                "modules": [
                    { "id": "module-3", "title": "Futures", "kind": "trivia" },
                ],
            },
        ],
    }))
    .expect("Invalid seed data")
}

pub async fn setup_server() -> TestServer {
    let db = MockDatabase::in_memory(seed_tables());
    let server = build_server_with_db(db).await.unwrap().1;
    TestServer::new(server).unwrap()
}

#[derive(Debug)]
pub struct FlowContext {
    pub store: HashMap<&'static str, Value>, // a way to pass data between steps
}

impl FlowContext {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
        }
    }

    pub fn store(&mut self, key: &'static str, val: Value) {
        self.store.insert(key, val);
    }

    pub fn get(&self, key: &str) -> &Value {
        self.store.get(key).expect("missing store key")
    }

    #[allow(unused)]
    pub fn get_json<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned,
    {
        let obj = self.get(key);
        serde_json::from_value(obj.clone()).expect("Invalid json format")
    }
}

pub struct Action {
    #[allow(unused)]
    pub name: &'static str,
    pub method: &'static str,
    pub path: String,
    pub dyn_path: Option<Box<dyn Fn(&FlowContext) -> String + Send + Sync>>,
    pub body: Option<Value>,
    pub dyn_body: Option<Box<dyn Fn(&FlowContext) -> Value + Send + Sync>>,
    pub expect: StatusCode,
    pub clear_cookies: bool,
    pub save_cookies: bool,
    pub query_params: Vec<(String, String)>,
    pub cookie_asserts: Vec<(&'static str, Box<dyn Fn(&Cookie) + Send + Sync>)>,
    pub body_asserts: Vec<Box<dyn Fn(&Value) + Send + Sync>>,
    pub save_as: Option<&'static str>,
}

#[allow(unused)]
impl Action {
    pub fn new(name: &'static str, method: &'static str, path: &str) -> Self {
        Self {
            name,
            method,
            path: path.to_string(),
            dyn_path: None,
            body: None,
            dyn_body: None,
            expect: StatusCode::OK,
            clear_cookies: false,
            save_cookies: true,
            query_params: vec![],
            cookie_asserts: vec![],
            body_asserts: vec![],
            save_as: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_expect(mut self, expect: StatusCode) -> Self {
        self.expect = expect;
        self
    }

    pub fn with_save_cookies(mut self, save_cookies: bool) -> Self {
        self.save_cookies = save_cookies;
        self
    }

    pub fn with_clear_cookies(mut self, clear_cookies: bool) -> Self {
        self.clear_cookies = clear_cookies;
        self
    }

    pub fn with_param(mut self, key: &str, val: &str) -> Self {
        self.query_params
            .push((String::from(key), String::from(val)));
        self
    }

    pub fn with_dyn_path<F>(mut self, f: F) -> Self
    where
        F: Fn(&FlowContext) -> String + Send + Sync + 'static,
    {
        self.dyn_path = Some(Box::new(f));
        self
    }

    pub fn with_dyn_body<F>(mut self, f: F) -> Self
    where
        F: Fn(&FlowContext) -> Value + Send + Sync + 'static,
    {
        self.dyn_body = Some(Box::new(f));
        self
    }

    pub fn with_save_as(mut self, key: &'static str) -> Self {
        self.save_as = Some(key);
        self
    }

    pub fn assert_cookie<F>(mut self, name: &'static str, check: F) -> Self
    where
        F: Fn(&Cookie) + Send + Sync + 'static,
    {
        self.cookie_asserts.push((name, Box::new(check)));
        self
    }

    pub fn assert_body<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.body_asserts.push(Box::new(check));
        self
    }
}

pub struct Flow {
    actions: Vec<Action>,
}

impl Flow {
    pub fn new() -> Self {
        Self { actions: vec![] }
    }

    pub fn step(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub async fn run(self, server: &mut TestServer) {
        let mut ctx = FlowContext::new(); // create new context for this flow
        for action in self.actions {
            println!("==> Running test action `{}`", action.name);
            if action.clear_cookies {
                server.clear_cookies();
            }

            if action.save_cookies {
                server.save_cookies();
            } else {
                server.do_not_save_cookies();
            }

            let path = if let Some(dyn_path_fn) = action.dyn_path {
                dyn_path_fn(&ctx)
            } else {
                action.path.clone()
            };

            let mut req = match action.method {
                "GET" => server.get(&path),
                "POST" => server.post(&path),
                "PUT" => server.put(&path),
                "PATCH" => server.patch(&path),
                "DELETE" => server.delete(&path),
                _ => panic!("unsupported method {}", action.method),
            };

            match (action.dyn_body, action.body) {
                (Some(f), _) => {
                    req = req.json(&f(&ctx));
                }
                (_, Some(json)) => req = req.json(&json),
                _ => {}
            }

            for (k, v) in action.query_params {
                req = req.add_query_param(&k, v);
            }

            let resp = req.await;
            resp.assert_status(action.expect);
            let cookies = resp.cookies();

            for (cookie_name, check) in action.cookie_asserts {
                let cookie = cookies
                    .get(cookie_name)
                    .unwrap_or_else(|| panic!("Cookie {} is not set", cookie_name));
                check(cookie);
            }

            if !action.body_asserts.is_empty() {
                let body = resp.json::<Value>();
                for check in action.body_asserts {
                    check(&body);
                }
            }

            if let Some(save_key) = action.save_as {
                let body = resp.json::<Value>();
                ctx.store(save_key, body);
            }
        }
    }
}

// Common actions builders

#[allow(unused)]
pub fn login_action(email: &str, password: &str) -> Action {
    Action::new("login", "POST", "/api/v1/auth/login").with_body(json!({
        "email": email,
        "password": password,
    }))
}

#[allow(unused)]
pub fn login_admin_action() -> Action {
    login_action("admin@lernboard.test", "admin")
}

#[allow(unused)]
pub fn login_student_action() -> Action {
    login_action("student@lernboard.test", "student")
}
