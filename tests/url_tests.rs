use routekit::config::RouterConfig;
use routekit::context::RequestContext;
use routekit::error::UrlGenerationError;
use routekit::router::{RouteCollector, RouteDefinition, RouteGroup, RouteTable};
use routekit::url::{ReferenceType, UrlGenerator, NO_PARAMS};

fn table() -> RouteTable {
    let mut routes = RouteCollector::new();
    routes
        .add(RouteDefinition::get("/users/{id}", "UserController@show").name("user_show"))
        .unwrap();
    routes
        .add(RouteDefinition::get("/users", "UserController@index").name("users_list"))
        .unwrap();
    routes
        .group(
            RouteGroup::new()
                .prefix("/blog")
                .domain("{locale}.blog.example.com"),
            |r| {
                r.add(
                    RouteDefinition::get("/{year}/{slug}/{page?}", "PostController@show")
                        .name("post")
                        .where_param("year", r"\d{4}"),
                )?;
                Ok(())
            },
        )
        .unwrap();
    routes.seal()
}

#[test]
fn test_reference_examples() {
    let table = table();
    let ctx = RequestContext::new();
    let urls = UrlGenerator::new(&table, &ctx);

    assert_eq!(
        urls.generate("user_show", [("id", 42)], ReferenceType::AbsolutePath)
            .unwrap(),
        "/users/42"
    );
    assert_eq!(
        urls.generate(
            "users_list",
            [("page", 2), ("limit", 10)],
            ReferenceType::AbsolutePath
        )
        .unwrap(),
        "/users?page=2&limit=10"
    );
}

#[test]
fn test_grouped_domain_route() {
    let table = table();
    let ctx = RequestContext::from_config(&RouterConfig {
        default_scheme: "https".to_string(),
        default_host: Some("www.example.com".to_string()),
        ..RouterConfig::default()
    });
    let urls = UrlGenerator::new(&table, &ctx);

    let url = urls
        .path(
            "post",
            [("locale", "en"), ("year", "2024"), ("slug", "hello-world"), ("ref", "home")],
        )
        .unwrap();
    assert_eq!(url, "https://en.blog.example.com/blog/2024/hello-world?ref=home");
}

#[test]
fn test_generated_url_routes_back() {
    let table = table();
    let ctx = RequestContext::new().with_host("fr.blog.example.com");
    let urls = UrlGenerator::new(&table, &ctx);

    let url = urls
        .path(
            "post",
            [("locale", "fr"), ("year", "1999"), ("slug", "bonjour"), ("page", "3")],
        )
        .unwrap();
    assert_eq!(url, "/blog/1999/bonjour/3");

    let m = table.find(&url, "GET", ctx.host()).unwrap();
    assert_eq!(m.route.name(), Some("post"));
    let params: Vec<(&str, &str)> = m.params.iter().map(|(k, v)| (k.as_ref(), v.as_str())).collect();
    assert_eq!(
        params,
        vec![("locale", "fr"), ("year", "1999"), ("slug", "bonjour"), ("page", "3")]
    );
}

#[test]
fn test_errors() {
    let table = table();
    let ctx = RequestContext::new();
    let urls = UrlGenerator::new(&table, &ctx);

    assert!(matches!(
        urls.path("missing_route", NO_PARAMS),
        Err(UrlGenerationError::RouteNameNotFound { .. })
    ));
    assert_eq!(
        urls.path("post", [("year", "2024"), ("slug", "x")]).unwrap_err(),
        UrlGenerationError::MissingParameter {
            route: "post".to_string(),
            parameter: "locale".to_string()
        }
    );
    assert_eq!(
        urls.path("post", [("locale", "en"), ("year", "2024")]).unwrap_err().to_string(),
        "route 'post' requires parameter 'slug'"
    );
}
