use chrono::{SubsecRound, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Role, User, UserStatus};

/// Resolves a bearer token to an active user.
pub fn authenticate(conn: &Connection, token: &str) -> Result<User, AppError> {
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }
    let user = queries::get_user_by_token(conn, token)?.ok_or(AppError::Unauthorized)?;
    if user.status == UserStatus::Banned {
        return Err(AppError::Forbidden("account is banned".to_string()));
    }
    Ok(user)
}

/// Makes sure an admin account exists for the configured bootstrap token.
pub fn ensure_bootstrap_admin(conn: &Connection, token: &str) -> anyhow::Result<User> {
    if let Some(user) = queries::get_user_by_token(conn, token)? {
        return Ok(user);
    }

    let id = uuid::Uuid::new_v4().to_string();
    let admin = User {
        email: format!("admin-{id}@localhost"),
        id,
        full_name: "Administrator".to_string(),
        role: Role::Admin,
        status: UserStatus::Active,
        api_token: token.to_string(),
        created_at: Utc::now().trunc_subsecs(0),
    };
    queries::insert_user(conn, &admin)?;
    tracing::info!(user_id = %admin.id, "created bootstrap admin");
    Ok(admin)
}

pub fn set_status(
    conn: &Connection,
    actor: &User,
    user_id: &str,
    status: UserStatus,
) -> Result<User, AppError> {
    if actor.id == user_id {
        return Err(AppError::validation("cannot change your own status"));
    }
    let target = queries::get_user(conn, user_id)?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    if target.is_admin() && status == UserStatus::Banned {
        return Err(AppError::Forbidden("cannot ban admin users".to_string()));
    }
    if !queries::update_user_status(conn, &target.id, status)? {
        return Err(AppError::NotFound("user not found".to_string()));
    }
    tracing::info!(user_id, status = status.as_str(), actor = %actor.id, "user status changed");
    queries::get_user(conn, user_id)?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_user, seed_user_with_role, setup_db};

    #[test]
    fn test_authenticate_known_token() {
        let conn = setup_db();
        let user = seed_user(&conn, "player");
        let found = authenticate(&conn, &user.api_token).unwrap();
        assert_eq!(found.id, user.id);
    }

    #[test]
    fn test_authenticate_unknown_token() {
        let conn = setup_db();
        assert!(matches!(
            authenticate(&conn, "nope").unwrap_err(),
            AppError::Unauthorized
        ));
        assert!(matches!(
            authenticate(&conn, "").unwrap_err(),
            AppError::Unauthorized
        ));
    }

    #[test]
    fn test_banned_user_rejected() {
        let conn = setup_db();
        let admin = seed_user_with_role(&conn, "admin", Role::Admin);
        let user = seed_user(&conn, "player");
        set_status(&conn, &admin, &user.id, UserStatus::Banned).unwrap();

        assert!(matches!(
            authenticate(&conn, &user.api_token).unwrap_err(),
            AppError::Forbidden(_)
        ));
    }

    #[test]
    fn test_admin_cannot_ban_self() {
        let conn = setup_db();
        let admin = seed_user_with_role(&conn, "admin", Role::Admin);
        assert!(matches!(
            set_status(&conn, &admin, &admin.id, UserStatus::Banned).unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn test_admin_cannot_ban_other_admin() {
        let conn = setup_db();
        let admin = seed_user_with_role(&conn, "admin", Role::Admin);
        let other = seed_user_with_role(&conn, "other admin", Role::Admin);

        let err = set_status(&conn, &admin, &other.id, UserStatus::Banned).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m == "cannot ban admin users"));

        let stored = queries::get_user(&conn, &other.id).unwrap().unwrap();
        assert_eq!(stored.status, UserStatus::Active);
        assert!(authenticate(&conn, &other.api_token).is_ok());
    }

    #[test]
    fn test_unknown_user_not_found() {
        let conn = setup_db();
        let admin = seed_user_with_role(&conn, "admin", Role::Admin);
        assert!(matches!(
            set_status(&conn, &admin, "missing", UserStatus::Banned).unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_bootstrap_admin_is_idempotent() {
        let conn = setup_db();
        let first = ensure_bootstrap_admin(&conn, "root-token").unwrap();
        let second = ensure_bootstrap_admin(&conn, "root-token").unwrap();
        assert_eq!(first.id, second.id);
        assert!(first.is_admin());
    }
}
