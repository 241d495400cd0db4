use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use social_api::handlers::{comments, jobs as job_handlers, posts, users};
use social_api::jobs::{DeferredJobClient, HttpJobRunnerClient};
use social_api::{middleware, Config};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn health_summary(pool: web::Data<PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "social-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "social-api"
        })),
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting social-api v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    middleware::init_jwt_secret(&config.auth.jwt_secret);

    let db_pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("migrations failed: {e}")))?;

    tracing::info!("Connected to database, migrations applied");

    let scheduler: Arc<dyn DeferredJobClient> =
        Arc::new(HttpJobRunnerClient::new(config.job_runner.url.clone()));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let config_data = web::Data::new(config.clone());
    let scheduler_data = web::Data::new(scheduler);

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in config.cors.allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(config_data.clone())
            .app_data(scheduler_data.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(social_api::metrics::serve_metrics))
            // Health check endpoints
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            // Job-runner callback, authenticated by shared token
            .route(
                "/internal/jobs/publish-post",
                web::post().to(job_handlers::publish_post),
            )
            .service(
                web::scope("/api/v1")
                    .wrap(middleware::JwtAuthMiddleware)
                    .service(
                        web::scope("/posts")
                            .service(
                                web::resource("")
                                    .route(web::get().to(posts::list_posts))
                                    .route(web::post().to(posts::create_post)),
                            )
                            .route("/schedule", web::post().to(posts::schedule_post))
                            .service(
                                web::resource("/{post_id}")
                                    .route(web::get().to(posts::get_post))
                                    .route(web::put().to(posts::update_post))
                                    .route(web::patch().to(posts::update_post))
                                    .route(web::delete().to(posts::delete_post)),
                            )
                            .route("/{post_id}/like", web::post().to(posts::like_post))
                            .route("/{post_id}/unlike", web::post().to(posts::unlike_post))
                            .service(
                                web::resource("/{post_id}/comments")
                                    .route(web::get().to(comments::list_comments))
                                    .route(web::post().to(comments::create_comment)),
                            )
                            .service(
                                web::resource("/{post_id}/comments/{comment_id}")
                                    .route(web::get().to(comments::get_comment))
                                    .route(web::delete().to(comments::delete_comment)),
                            ),
                    )
                    .service(
                        web::scope("/profile").service(
                            web::resource("")
                                .route(web::get().to(users::get_profile))
                                .route(web::put().to(users::update_profile))
                                .route(web::patch().to(users::update_profile))
                                .route(web::delete().to(users::delete_profile)),
                        ),
                    )
                    .service(
                        web::scope("/users")
                            .service(web::resource("").route(web::get().to(users::list_users)))
                            .service(
                                web::resource("/{user_id}").route(web::get().to(users::get_user)),
                            )
                            .route("/{user_id}/follow", web::post().to(users::follow_user))
                            .route("/{user_id}/unfollow", web::post().to(users::unfollow_user)),
                    ),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}
