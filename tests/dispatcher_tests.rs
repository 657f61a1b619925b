use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use http::Method;
use routekit::context::RequestContext;
use routekit::dispatcher::{
    ActionController, Authorization, Authorizer, ControllerRegistry, Dispatcher, GrantTable,
    HandlerOutput, HandlerRequest, HandlerResponse, RecordingSink, ResponseSink, WriterSink,
    HANDLER_DEBUG_HEADER, ROUTE_DEBUG_HEADER,
};
use routekit::error::DispatchError;
use routekit::middleware::{from_fn, Middleware};
use routekit::pattern::ParamVec;
use routekit::router::{HandlerId, RouteCollector, RouteDefinition, RouteGroup};
use serde_json::json;

use tracing_util::TestTracing;

type Log = Arc<Mutex<Vec<String>>>;

/// Middleware that records its before/after phases, optionally without calling `next`.
fn recording(name: &'static str, log: &Log, short_circuit: bool) -> Arc<dyn Middleware> {
    let log = Arc::clone(log);
    Arc::new(from_fn(name, move |req, next| {
        log.lock().unwrap().push(format!("{name}-before"));
        let resp = if short_circuit {
            HandlerResponse::error(401, "stopped")
        } else {
            next.run(req)?
        };
        log.lock().unwrap().push(format!("{name}-after"));
        Ok(resp)
    }))
}

fn controllers(log: &Log) -> ControllerRegistry {
    let mut registry = ControllerRegistry::new();
    let handler_log = Arc::clone(log);
    registry.register(
        "UserController",
        Arc::new(
            ActionController::new()
                .action("show", move |_req, args| {
                    handler_log.lock().unwrap().push("H".to_string());
                    Ok(HandlerResponse::json(200, json!({ "id": args[0] })))
                })
                .action("index", |req: &HandlerRequest, _args: &[&str]| {
                    Ok(json!({ "query": req.query.clone() }))
                })
                .action("fail", |_req: &HandlerRequest, _args: &[&str]| -> anyhow::Result<()> {
                    Err(anyhow!("database unavailable"))
                }),
        ),
    );
    registry.register(
        "Admin::ReportController",
        Arc::new(ActionController::new().action(
            "show",
            |req: &HandlerRequest, args: &[&str]| {
                Ok(HandlerResponse::json(
                    200,
                    json!({
                        "args": args,
                        "route": req.route_name,
                        "handler": req.handler.as_ref().map(ToString::to_string),
                    }),
                ))
            },
        )),
    );
    registry
}

fn get(path: &str) -> HandlerRequest {
    HandlerRequest::new(Method::GET, path)
}

#[test]
fn test_dispatch_invokes_action_with_params() {
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/users/{id}", "UserController@show"))
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));

    let mut sink = RecordingSink::new();
    let resp = dispatcher
        .dispatch(get("/users/42"), &RequestContext::new(), &controllers(&log), &mut sink)
        .unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!({ "id": "42" }));
    assert_eq!(sink.sent.len(), 1);
    assert_eq!(sink.last(), Some(&resp));
}

#[test]
fn test_middleware_onion_order() {
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .group(RouteGroup::new().middleware(recording("A", &log, false)), |r| {
            r.add(
                RouteDefinition::get("/users/{id}", "UserController@show")
                    .middleware(recording("B", &log, false))
                    .middleware(recording("C", &log, false)),
            )?;
            Ok(())
        })
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));

    let mut sink = RecordingSink::new();
    dispatcher
        .dispatch(get("/users/1"), &RequestContext::new(), &controllers(&log), &mut sink)
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["A-before", "B-before", "C-before", "H", "C-after", "B-after", "A-after"]
    );
}

#[test]
fn test_middleware_short_circuit() {
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .add(
            RouteDefinition::get("/users/{id}", "UserController@show")
                .middleware(recording("A", &log, false))
                .middleware(recording("B", &log, true))
                .middleware(recording("C", &log, false)),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));

    let mut sink = RecordingSink::new();
    let resp = dispatcher
        .dispatch(get("/users/1"), &RequestContext::new(), &controllers(&log), &mut sink)
        .unwrap();

    assert_eq!(resp.status, 401);
    assert_eq!(*log.lock().unwrap(), vec!["A-before", "B-before", "B-after", "A-after"]);
    assert_eq!(sink.sent.len(), 1);
}

#[test]
fn test_route_not_found() {
    let tracing = TestTracing::init();
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::post("/users", "UserController@store"))
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));

    let mut sink = RecordingSink::new();
    let err = dispatcher
        .dispatch(get("/users"), &RequestContext::new(), &controllers(&log), &mut sink)
        .unwrap_err();

    match &err {
        DispatchError::RouteNotFound { uri, method } => {
            assert_eq!(uri, "/users");
            assert_eq!(method, "GET");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.status(), 404);
    assert!(sink.sent.is_empty());
    assert!(tracing.logs.contains("Route not found"));
}

#[test]
fn test_handler_not_found() {
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/ghost", "GhostController"))
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));

    let err = dispatcher
        .dispatch(get("/ghost"), &RequestContext::new(), &controllers(&log), &mut RecordingSink::new())
        .unwrap_err();
    assert!(matches!(err, DispatchError::HandlerNotFound { handler } if handler == "GhostController"));
}

#[test]
fn test_controller_error_propagates_unchanged() {
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/boom", "UserController@fail"))
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));

    let mut sink = RecordingSink::new();
    let err = dispatcher
        .dispatch(get("/boom"), &RequestContext::new(), &controllers(&log), &mut sink)
        .unwrap_err();
    assert!(matches!(err, DispatchError::Downstream(_)));
    assert_eq!(err.to_string(), "database unavailable");
    assert!(sink.sent.is_empty());
}

#[test]
fn test_non_response_output_becomes_empty_200() {
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/users", "UserController@index"))
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));

    let resp = dispatcher
        .dispatch(get("/users/?page=2"), &RequestContext::new(), &controllers(&log), &mut RecordingSink::new())
        .unwrap();
    assert_eq!(resp, HandlerResponse::empty(200));
    assert_eq!(HandlerOutput::from(json!(1)).into_response().status, 200);
}

#[test]
fn test_request_is_annotated_with_route() {
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .group(RouteGroup::new().prefix("/admin").namespace("Admin"), |r| {
            r.add(
                RouteDefinition::get("/reports/{slug}/{page?}", "ReportController@show")
                    .name("admin_report"),
            )?;
            Ok(())
        })
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));

    let resp = dispatcher
        .dispatch(get("/admin/reports/q3-sales/4"), &RequestContext::new(), &controllers(&log), &mut RecordingSink::new())
        .unwrap();
    assert_eq!(
        resp.body,
        json!({
            "args": ["q3-sales", "4"],
            "route": "admin_report",
            "handler": "Admin::ReportController@show",
        })
    );
}

#[test]
fn test_host_from_context_selects_domain_route() {
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .add(
            RouteDefinition::get("/users/{id}", "UserController@show")
                .domain("{account}.example.com"),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));
    let registry = controllers(&log);

    let ctx = RequestContext::new().with_host("acme.example.com");
    let resp = dispatcher
        .dispatch(get("/users/9"), &ctx, &registry, &mut RecordingSink::new())
        .unwrap();
    // Domain parameters come first
    assert_eq!(resp.body, json!({ "id": "acme" }));

    let err = dispatcher
        .dispatch(get("/users/9"), &RequestContext::new(), &registry, &mut RecordingSink::new())
        .unwrap_err();
    assert!(matches!(err, DispatchError::RouteNotFound { .. }));
}

#[test]
fn test_grant_table_denies_and_allows() {
    let tracing = TestTracing::init();
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/users/{id}", "UserController@show"))
        .unwrap();
    let grants = GrantTable::new().require("UserController@show", "users.view");
    let dispatcher = Dispatcher::new(Arc::new(routes.seal())).with_authorizer(Arc::new(grants));
    let registry = controllers(&log);

    let mut sink = RecordingSink::new();
    let denied = dispatcher
        .dispatch(get("/users/1"), &RequestContext::new(), &registry, &mut sink)
        .unwrap();
    assert_eq!(denied.status, 403);
    assert_eq!(denied.body, json!({ "error": "Forbidden", "missing": ["users.view"] }));
    assert!(log.lock().unwrap().is_empty());
    assert!(tracing.logs.contains("Authorization denied"));

    let ctx = RequestContext::new().grant("users.view");
    let allowed = dispatcher
        .dispatch(get("/users/1"), &ctx, &registry, &mut sink)
        .unwrap();
    assert_eq!(allowed.status, 200);
    assert_eq!(sink.sent.len(), 2);
}

struct DenyOddIds;

impl Authorizer for DenyOddIds {
    fn authorize(
        &self,
        _handler: &HandlerId,
        params: &ParamVec,
        _ctx: &RequestContext,
    ) -> anyhow::Result<Authorization> {
        let odd = params
            .iter()
            .any(|(_, v)| v.parse::<u64>().map(|n| n % 2 == 1).unwrap_or(false));
        Ok(if odd {
            Authorization::Denied(HandlerResponse::error(404, "hidden"))
        } else {
            Authorization::Allowed
        })
    }
}

#[test]
fn test_custom_authorizer_sees_params() {
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/users/{id}", "UserController@show"))
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal())).with_authorizer(Arc::new(DenyOddIds));
    let registry = controllers(&log);

    let odd = dispatcher
        .dispatch(get("/users/3"), &RequestContext::new(), &registry, &mut RecordingSink::new())
        .unwrap();
    assert_eq!(odd.status, 404);
    let even = dispatcher
        .dispatch(get("/users/4"), &RequestContext::new(), &registry, &mut RecordingSink::new())
        .unwrap();
    assert_eq!(even.status, 200);
}

#[test]
fn test_debug_headers() {
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/users/{id}", "UserController@show"))
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));
    let registry = controllers(&log);

    let resp = dispatcher
        .dispatch(get("/users/1"), &RequestContext::new().with_debug(true), &registry, &mut RecordingSink::new())
        .unwrap();
    assert_eq!(resp.get_header(ROUTE_DEBUG_HEADER), Some("/users/{id}"));
    assert_eq!(resp.get_header(HANDLER_DEBUG_HEADER), Some("UserController@show"));

    let resp = dispatcher
        .dispatch(get("/users/1"), &RequestContext::new(), &registry, &mut RecordingSink::new())
        .unwrap();
    assert!(resp.get_header(ROUTE_DEBUG_HEADER).is_none());
}

struct FailingSink;

impl ResponseSink for FailingSink {
    fn send(&mut self, _resp: &HandlerResponse) -> anyhow::Result<()> {
        Err(anyhow!("connection reset"))
    }
}

#[test]
fn test_sink_error_is_downstream() {
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/users/{id}", "UserController@show"))
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));

    let err = dispatcher
        .dispatch(get("/users/1"), &RequestContext::new(), &controllers(&log), &mut FailingSink)
        .unwrap_err();
    assert!(matches!(err, DispatchError::Downstream(_)));
    assert_eq!(err.status(), 500);
}

#[test]
fn test_writer_sink_output() {
    let log = Log::default();
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/users/{id}", "UserController@show"))
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));

    let mut sink = WriterSink::new(Vec::new());
    dispatcher
        .dispatch(get("/users/5"), &RequestContext::new(), &controllers(&log), &mut sink)
        .unwrap();
    let raw = String::from_utf8(sink.into_inner()).unwrap();
    assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(raw.ends_with("{\"id\":\"5\"}"));
}

#[test]
fn test_request_id_header_reaches_controller() {
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/ping", "PingController"))
        .unwrap();
    let dispatcher = Dispatcher::new(Arc::new(routes.seal()));

    let mut controllers = ControllerRegistry::new();
    controllers.register(
        "PingController",
        Arc::new(ActionController::new().action(
            "__invoke",
            |req: &HandlerRequest, _args: &[&str]| {
                Ok(HandlerResponse::json(200, json!({ "request_id": req.request_id.to_string() })))
            },
        )),
    );

    let incoming = get("/ping").with_header("x-request-id", "01ARZ3NDEKTSV4RRFFQ69G5FAV");
    let ctx = RequestContext::for_request(&routekit::config::RouterConfig::default(), &incoming);
    let mut sink = RecordingSink::new();
    let resp = dispatcher
        .dispatch(incoming, &ctx, &controllers, &mut sink)
        .unwrap();
    assert_eq!(resp.body["request_id"], "01ARZ3NDEKTSV4RRFFQ69G5FAV");
}
