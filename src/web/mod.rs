//! HTTP surface.
//!
//! Reads are public; every create, update, list mutation, delete and upload
//! passes through [`require_auth`] first.

pub mod error;
pub mod handlers;

use crate::auth::{TokenSigner, require_auth};
use crate::content::PageKind;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{MethodRouter, get, patch, post, put};
use axum::{Extension, Router, middleware};
use handlers::{ListRoute, auth, locations, pages, upload};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use error::{ErrorResponse, JsonBody};

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Singleton pages and the path each is served under.
const SINGLETON_PAGES: [(&str, PageKind); 6] = [
    ("/homepage", PageKind::Home),
    ("/aboutpage", PageKind::About),
    ("/productspage", PageKind::Products),
    ("/micapage", PageKind::Mica),
    ("/csrpage", PageKind::Csr),
    ("/contactuspage", PageKind::ContactUs),
];

/// List routes on singleton pages.
const SINGLETON_LISTS: [(&str, ListRoute); 5] = [
    (
        "/productspage/productsection",
        ListRoute::new(PageKind::Products, "productsSection"),
    ),
    (
        "/micapage/sectiontwo/points",
        ListRoute::new(PageKind::Mica, "sectionTwo.points"),
    ),
    (
        "/micapage/sectionthree/subproducts",
        ListRoute::new(PageKind::Mica, "sectionThree.subProducts"),
    ),
    (
        "/csrpage/sectiontwo/subproducts",
        ListRoute::new(PageKind::Csr, "sectionTwo.subProducts"),
    ),
    (
        "/contactus/enquiry",
        ListRoute::new(PageKind::ContactUs, "enquiryForm"),
    ),
];

pub fn build_router(state: AppState) -> Router {
    let tokens = Arc::clone(&state.tokens);
    let upload_limit = usize::try_from(state.uploads.max_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    for (path, kind) in SINGLETON_PAGES {
        router = router.route(
            path,
            get(pages::get_singleton)
                .merge(guarded(
                    post(pages::create_page).patch(pages::patch_singleton),
                    &tokens,
                ))
                .layer(Extension(kind)),
        );
    }

    for (path, route) in SINGLETON_LISTS {
        router = router.route(
            path,
            guarded(put(pages::mutate_singleton_list), &tokens).layer(Extension(route)),
        );
    }

    let router = router
        .route(
            "/quartzpage",
            guarded(post(pages::create_page), &tokens).layer(Extension(PageKind::Quartz)),
        )
        .route(
            "/quartzpage/:index",
            get(pages::get_indexed)
                .merge(guarded(
                    patch(pages::patch_indexed),
                    &tokens,
                ))
                .layer(Extension(PageKind::Quartz)),
        )
        .route(
            "/quartzpage/:index/sectiontwo/points",
            guarded(put(pages::mutate_indexed_list), &tokens).layer(Extension(
                ListRoute::new(PageKind::Quartz, "sectionTwo.points"),
            )),
        )
        .route(
            "/newproductpage",
            get(pages::list_pages)
                .merge(guarded(post(pages::create_page), &tokens))
                .layer(Extension(PageKind::NewProduct)),
        )
        .route(
            "/newproductpage/:id",
            get(pages::get_by_id)
                .merge(guarded(
                    patch(pages::patch_by_id).delete(pages::delete_by_id),
                    &tokens,
                ))
                .layer(Extension(PageKind::NewProduct)),
        )
        .route(
            "/locationpage",
            get(locations::list_locations)
                .merge(guarded(post(locations::create_location), &tokens)),
        )
        .route(
            "/locationpage/:id",
            get(locations::get_location).merge(guarded(
                patch(locations::patch_location)
                    .delete(locations::delete_location),
                &tokens,
            )),
        )
        .route(
            "/upload/image",
            guarded(post(upload::upload_image), &tokens)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/upload/video",
            guarded(post(upload::upload_video), &tokens)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .nest_service("/uploads", ServeDir::new(state.uploads.root()));

    let cors = cors_layer(&state.cors_origins);
    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn guarded(routes: MethodRouter<AppState>, tokens: &Arc<TokenSigner>) -> MethodRouter<AppState> {
    routes.route_layer(middleware::from_fn_with_state(
        Arc::clone(tokens),
        require_auth,
    ))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(parsed)
}
