/**
 * API Routes
 *
 * # Routes
 *
 * ## Authentication (public)
 * - `POST /api/auth/register-or-login`
 * - `GET /api/auth/exists?phone=`
 *
 * ## Users
 * - `GET /api/users/search?q=`, `GET /api/users/me`, `GET /api/users/mobile/{phone}`
 * - `GET /api/users/posts` (caller's own posts)
 * - `GET|PUT /api/users/{userId}` (PUT takes JSON or a multipart form with `image`)
 * - `POST|PUT|DELETE /api/users/push-token`
 *
 * ## Groups
 * - `GET|POST /api/groups`, `POST /api/groups/join`
 * - `GET|PUT|DELETE /api/groups/{id}`
 * - `POST /api/groups/{id}/invite`, `POST /api/groups/{id}/members`
 * - `GET|POST /api/groups/{id}/messages`, `DELETE /api/groups/{id}/messages/{messageId}`
 *
 * ## Posts
 * - `GET|POST /api/posts`
 * - `POST /api/posts/{postId}/like`, `POST /api/posts/{postId}/comments`
 *
 * ## Notifications
 * - `GET /api/notifications`, `PUT /api/notifications/mark-read`
 *
 * Everything except the authentication routes requires a session token;
 * handlers take the `AuthUser` extractor.
 */

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::backend::auth::{phone_exists, register_or_login};
use crate::backend::groups::handlers as groups;
use crate::backend::messages::handlers as messages;
use crate::backend::notifications::handlers as notifications;
use crate::backend::posts::handlers as posts;
use crate::backend::server::state::AppState;
use crate::backend::users::handlers as users;

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // Authentication endpoints
        .route("/api/auth/register-or-login", post(register_or_login))
        .route("/api/auth/exists", get(phone_exists))
        // User endpoints
        .route("/api/users/search", get(users::search_users))
        .route("/api/users/me", get(users::get_me))
        .route("/api/users/mobile/{phone}", get(users::find_by_mobile))
        .route("/api/users/posts", get(posts::list_own_posts))
        .route(
            "/api/users/push-token",
            post(users::register_push_token)
                .put(users::update_push_token)
                .delete(users::clear_push_token),
        )
        .route("/api/users/{user_id}", get(users::get_user).put(users::update_user))
        // Group endpoints
        .route("/api/groups", get(groups::list_groups).post(groups::create_group))
        .route("/api/groups/join", post(groups::join_group))
        .route(
            "/api/groups/{id}",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route("/api/groups/{id}/invite", post(groups::invite))
        .route("/api/groups/{id}/members", post(groups::add_members))
        // Group chat endpoints
        .route(
            "/api/groups/{id}/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route("/api/groups/{id}/messages/{message_id}", delete(messages::delete_message))
        // Post endpoints
        .route("/api/posts", get(posts::list_posts).post(posts::create_post))
        .route("/api/posts/{post_id}/like", post(posts::toggle_like))
        .route("/api/posts/{post_id}/comments", post(posts::add_comment))
        // Notification endpoints
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/mark-read", put(notifications::mark_read))
}
