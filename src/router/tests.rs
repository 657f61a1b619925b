use std::sync::Arc;

use super::*;
use crate::error::RouteError;
use crate::middleware::{from_fn, Middleware};

fn names(params: &crate::pattern::ParamVec) -> Vec<(&str, &str)> {
    params.iter().map(|(k, v)| (k.as_ref(), v.as_str())).collect()
}

fn passthrough(name: &str) -> Arc<dyn Middleware> {
    Arc::new(from_fn(name, |req, next| next.run(req)))
}

#[test]
fn test_handler_id_parse() {
    let id = HandlerId::parse("UserController@show");
    assert_eq!(id.controller(), "UserController");
    assert_eq!(id.action(), "show");
    assert_eq!(id.to_string(), "UserController@show");

    let id = HandlerId::parse("InvokableController");
    assert_eq!(id.action(), DEFAULT_ACTION);
}

#[test]
fn test_handler_id_namespace() {
    let id = HandlerId::qualified("UserController@show", Some("Admin"));
    assert_eq!(id.controller(), "Admin::UserController");

    let id = HandlerId::qualified("::Shared::HealthController@ping", Some("Admin"));
    assert_eq!(id.controller(), "Shared::HealthController");
    assert_eq!(id.action(), "ping");
}

#[test]
fn test_normalize_path() {
    assert_eq!(normalize_path(""), "/");
    assert_eq!(normalize_path("/"), "/");
    assert_eq!(normalize_path("//users//42/"), "/users/42");
    assert_eq!(normalize_path("users"), "/users");
    assert_eq!(normalize_path("/files/{path:a//b}"), "/files/{path:a//b}");
    assert_eq!(normalize_prefix("/"), "");
    assert_eq!(join_path("/admin", "/"), "/admin");
    assert_eq!(join_path("", "/users"), "/users");
}

#[test]
fn test_method_filter() {
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::post("/users", "UserController@store"))
        .unwrap();
    let table = routes.seal();

    assert!(table.find("/users", "POST", None).is_some());
    assert!(table.find("/users", "post", None).is_some());
    assert!(table.find("/users", "GET", None).is_none());
}

#[test]
fn test_get_allows_head() {
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/", "HomeController"))
        .unwrap();
    let table = routes.seal();
    assert!(table.find("/", "HEAD", None).is_some());
    assert!(table.find("/", "DELETE", None).is_none());
}

#[test]
fn test_first_match_wins() {
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/users/{name}", "UserController@byName"))
        .unwrap();
    routes
        .add(RouteDefinition::get("/users/me", "UserController@me"))
        .unwrap();
    let table = routes.seal();

    let m = table.find("/users/me", "GET", None).unwrap();
    assert_eq!(m.route.target().action(), "byName");
}

#[test]
fn test_optional_search_param() {
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/search/{query?}", "SearchController"))
        .unwrap();
    let table = routes.seal();

    assert!(table.find("/search", "GET", None).unwrap().params.is_empty());
    let m = table.find("/search/hello", "GET", None).unwrap();
    assert_eq!(names(&m.params), vec![("query", "hello")]);
}

#[test]
fn test_where_constraint() {
    let mut routes = RouteCollector::new();
    routes
        .add(
            RouteDefinition::get("/archive/{year}", "ArchiveController@year")
                .where_param("year", r"\d{4}"),
        )
        .unwrap();
    let table = routes.seal();

    assert!(table.find("/archive/2024", "GET", None).is_some());
    assert!(table.find("/archive/24", "GET", None).is_none());
    assert!(table.find("/archive/abcd", "GET", None).is_none());
}

#[test]
fn test_invalid_where_constraint() {
    let mut routes = RouteCollector::new();
    let err = routes
        .add(RouteDefinition::get("/x/{y}", "X").where_param("y", "("))
        .unwrap_err();
    assert!(matches!(err, RouteError::Pattern { .. }));
}

#[test]
fn test_literal_domain() {
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/", "ApiController").domain("api.example.com"))
        .unwrap();
    let table = routes.seal();

    assert!(table.find("/", "GET", Some("api.example.com")).is_some());
    assert!(table.find("/", "GET", Some("API.Example.com")).is_some());
    assert!(table.find("/", "GET", Some("www.example.com")).is_none());
    assert!(table.find("/", "GET", None).is_none());
}

#[test]
fn test_domain_params_come_first() {
    let mut routes = RouteCollector::new();
    routes
        .add(
            RouteDefinition::get("/posts/{id}", "PostController@show")
                .domain("{tenant}.example.com"),
        )
        .unwrap();
    let table = routes.seal();

    let m = table.find("/posts/7", "GET", Some("acme.example.com")).unwrap();
    assert_eq!(names(&m.params), vec![("tenant", "acme"), ("id", "7")]);
    assert!(table.find("/posts/7", "GET", Some("example.com")).is_none());
}

#[test]
fn test_duplicate_name_rejected() {
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/a", "A").name("dup"))
        .unwrap();
    let err = routes
        .add(RouteDefinition::get("/b", "B").name("dup"))
        .unwrap_err();
    match err {
        RouteError::DuplicateName { name, existing } => {
            assert_eq!(name, "dup");
            assert_eq!(existing, "/a");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(routes.len(), 1);
}

#[test]
fn test_invalid_method_and_empty_methods() {
    let mut routes = RouteCollector::new();
    let err = routes
        .add(RouteDefinition::new(["GE T"], "/", "X"))
        .unwrap_err();
    assert!(matches!(err, RouteError::InvalidMethod { .. }));

    let err = routes
        .add(RouteDefinition::new(Vec::<String>::new(), "/", "X"))
        .unwrap_err();
    assert!(matches!(err, RouteError::NoMethods { .. }));
}

#[test]
fn test_bad_template_reports_template() {
    let mut routes = RouteCollector::new();
    let err = routes
        .add(RouteDefinition::get("/users/{id", "X"))
        .unwrap_err();
    match err {
        RouteError::Pattern { template, .. } => assert_eq!(template, "/users/{id"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_group_applies_attributes() {
    let mut routes = RouteCollector::new();
    routes
        .group(
            RouteGroup::new()
                .prefix("/admin/")
                .namespace("Admin")
                .domain("{tenant}.example.com")
                .middleware(passthrough("auth")),
            |r| {
                r.add(
                    RouteDefinition::get("/users/{id}", "UserController@show")
                        .middleware(passthrough("audit")),
                )?;
                Ok(())
            },
        )
        .unwrap();
    let table = routes.seal();
    let route = &table.routes()[0];

    assert_eq!(route.pattern().raw(), "/admin/users/{id}");
    assert_eq!(route.target().controller(), "Admin::UserController");
    assert_eq!(route.domain().map(|d| d.raw()), Some("{tenant}.example.com"));
    let mw: Vec<&str> = route.middleware().iter().map(|m| m.name()).collect();
    assert_eq!(mw, vec!["auth", "audit"]);
}

#[test]
fn test_route_domain_overrides_group() {
    let mut routes = RouteCollector::new();
    routes
        .group(RouteGroup::new().domain("a.example.com"), |r| {
            r.add(RouteDefinition::get("/", "X").domain("b.example.com"))?;
            r.add(RouteDefinition::get("/y", "Y"))?;
            Ok(())
        })
        .unwrap();
    let table = routes.seal();
    assert_eq!(table.routes()[0].domain().map(|d| d.raw()), Some("b.example.com"));
    assert_eq!(table.routes()[1].domain().map(|d| d.raw()), Some("a.example.com"));
}

#[test]
fn test_nested_groups_merge() {
    let mut routes = RouteCollector::new();
    routes
        .group(
            RouteGroup::new().prefix("/api").namespace("Api").middleware(passthrough("a")),
            |r| {
                r.group(
                    RouteGroup::new().prefix("v1").namespace("V1").middleware(passthrough("b")),
                    |r| {
                        r.add(RouteDefinition::get("/ping", "PingController"))?;
                        Ok(())
                    },
                )?;
                r.add(RouteDefinition::get("/health", "HealthController"))?;
                Ok(())
            },
        )
        .unwrap();
    let table = routes.seal();

    let ping = &table.routes()[0];
    assert_eq!(ping.pattern().raw(), "/api/v1/ping");
    assert_eq!(ping.target().controller(), "Api::V1::PingController");
    let mw: Vec<&str> = ping.middleware().iter().map(|m| m.name()).collect();
    assert_eq!(mw, vec!["a", "b"]);

    let health = &table.routes()[1];
    assert_eq!(health.pattern().raw(), "/api/health");
    assert_eq!(health.target().controller(), "Api::HealthController");
}

#[test]
fn test_group_popped_on_error() {
    let mut routes = RouteCollector::new();
    let result = routes.group(RouteGroup::new().prefix("/broken"), |r| {
        r.add(RouteDefinition::get("/{", "X"))?;
        Ok(())
    });
    assert!(result.is_err());
    assert!(routes.current_group().is_none());

    routes.add(RouteDefinition::get("/ok", "Ok")).unwrap();
    let table = routes.seal();
    assert_eq!(table.routes()[0].pattern().raw(), "/ok");
}

#[test]
fn test_merge_is_associative() {
    let a = RouteGroup::new().prefix("/a").namespace("A").middleware(passthrough("m1"));
    let b = RouteGroup::new().prefix("b/").domain("b.test");
    let c = RouteGroup::new().prefix("/c").namespace("C").domain("c.test");

    let left = c.merge_with(&b.merge_with(&a));
    let right = c.merge_with(&b).merge_with(&a);

    assert_eq!(left.get_prefix(), right.get_prefix());
    assert_eq!(left.get_prefix(), "/a/b/c");
    assert_eq!(left.get_namespace(), right.get_namespace());
    assert_eq!(left.get_namespace(), Some("A::C"));
    assert_eq!(left.get_domain(), right.get_domain());
    assert_eq!(left.get_domain(), Some("c.test"));
    assert_eq!(left.get_middleware().len(), right.get_middleware().len());
}

#[test]
fn test_allowed_methods() {
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/users/{id}", "UserController@show"))
        .unwrap();
    routes
        .add(RouteDefinition::delete("/users/{id}", "UserController@destroy"))
        .unwrap();
    let table = routes.seal();

    let methods = table.allowed_methods("/users/5", None);
    assert_eq!(methods, vec![http::Method::GET, http::Method::HEAD, http::Method::DELETE]);
    assert!(table.allowed_methods("/nothing", None).is_empty());
}

#[test]
fn test_by_name_and_display() {
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/users/{id}", "UserController@show").name("user_show"))
        .unwrap();
    let table = routes.seal();

    assert!(table.has_route("user_show"));
    assert!(!table.has_route("missing"));
    assert_eq!(table.by_name("user_show").unwrap().pattern().raw(), "/users/{id}");

    let listing = table.to_string();
    assert!(listing.starts_with("[routes] count=1"));
    assert!(listing.contains("/users/{id} -> UserController@show [user_show]"));
}
