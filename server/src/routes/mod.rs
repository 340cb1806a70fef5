use axum::http::{header, HeaderValue, Request};
use axum::routing::{get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{attendee, event, health_check, role, settings, template, user};
use crate::registry::AppRegistry;

/// Tags every request with a random `x-request-id`.
#[derive(Clone, Copy, Default)]
struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

fn event_routes() -> Router<AppRegistry> {
    let events = Router::new()
        .route("/", get(event::list_events).post(event::create_event))
        .route(
            "/:event_id",
            get(event::show_event)
                .put(event::update_event)
                .delete(event::delete_event),
        )
        .route("/:event_id/stats", get(event::show_event_stats))
        .route("/:event_id/form", get(event::show_registration_form))
        .route("/:event_id/template", put(event::save_event_template))
        .route("/:event_id/print", post(event::print_credentials))
        .route(
            "/:event_id/attendees",
            get(attendee::list_attendees).post(attendee::register_attendee),
        )
        .route(
            "/:event_id/attendees/:attendee_id",
            get(attendee::show_attendee)
                .put(attendee::update_attendee)
                .delete(attendee::delete_attendee),
        )
        .route(
            "/:event_id/attendees/:attendee_id/form",
            get(attendee::show_edit_form),
        )
        .route(
            "/:event_id/attendees/:attendee_id/credential",
            get(attendee::render_credential).layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )),
        );

    Router::new().nest("/events", events)
}

fn template_routes() -> Router<AppRegistry> {
    let templates = Router::new()
        .route(
            "/",
            get(template::list_templates).post(template::create_template),
        )
        .route(
            "/:template_id",
            get(template::show_template)
                .put(template::update_template)
                .delete(template::delete_template),
        );

    Router::new().nest("/templates", templates)
}

fn user_routes() -> Router<AppRegistry> {
    let users = Router::new()
        .route("/", get(user::list_users).post(user::create_user))
        .route(
            "/:user_id",
            get(user::show_user)
                .put(user::update_user)
                .delete(user::delete_user),
        );
    let roles = Router::new()
        .route("/", get(role::list_roles).post(role::create_role))
        .route(
            "/:role_id",
            get(role::show_role)
                .put(role::update_role)
                .delete(role::delete_role),
        );

    Router::new().nest("/users", users).nest("/roles", roles)
}

fn settings_routes() -> Router<AppRegistry> {
    let settings = Router::new()
        .route(
            "/",
            get(settings::show_settings).put(settings::update_settings),
        )
        .route("/reset", post(settings::reset_settings));

    Router::new().nest("/settings", settings)
}

pub fn create_routes(registry: AppRegistry, config: &Config) -> Router {
    let api = Router::new()
        .route("/session", get(event::show_session))
        .route("/dashboard", get(event::show_dashboard))
        .merge(event_routes())
        .merge(template_routes())
        .merge(user_routes())
        .merge(settings_routes());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .with_state(registry)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(RequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(create_security_headers_layer(config.environment))
        .layer(create_cors_layer(&config.allowed_origins))
}
