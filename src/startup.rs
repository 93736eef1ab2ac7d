use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::JwtAuth;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{get_current_user, health_check, login, refresh_token};

pub fn run(listener: TcpListener, auth: JwtAuth) -> Result<Server, std::io::Error> {
    let auth = web::Data::new(auth);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(auth.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh_token", web::get().to(refresh_token))
            .route("/auth/refresh_token", web::post().to(refresh_token))

            // Protected routes (require JWT authentication)
            .service(
                web::scope("/api")
                    .wrap(JwtMiddleware::new(auth.clone()))
                    .route("/me", web::get().to(get_current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
