/// User store
///
/// Email addresses are unique across all users (ASCII case-insensitive).
/// The check runs under the store's write guard, before anything is mutated.
use crate::{
    error::{MeshError, MeshResult},
    stats::UserStats,
    store::{provided, Record, RecordStore},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Author,
    Reader,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Author => "author",
            Role::Reader => "reader",
        }
    }

    /// Capitalized name used in default bios
    fn title(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Author => "Author",
            Role::Reader => "Reader",
        }
    }
}

impl FromStr for Role {
    type Err = MeshError;

    fn from_str(s: &str) -> MeshResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "author" => Ok(Role::Author),
            "reader" => Ok(Role::Reader),
            _ => Err(MeshError::Validation(format!("Invalid role: {}", s))),
        }
    }
}

/// User record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub profile_picture: String,
}

impl Record for User {
    const KIND: &'static str = "User";

    fn id(&self) -> u64 {
        self.id
    }
}

/// Create user request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewUser {
    #[validate(
        required(message = "name is required"),
        length(min = 1, message = "name is required")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "email is required"),
        email(message = "email must be a valid address")
    )]
    pub email: Option<String>,
    pub role: Option<String>,
    pub bio: Option<String>,
}

/// Partial user update
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserPatch {
    pub name: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    pub role: Option<String>,
    pub bio: Option<String>,
}

/// Avatar URL derived from a display name
pub fn profile_picture_for(name: &str) -> String {
    let seed: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", seed)
}

fn email_taken(users: &[User], email: &str, except: Option<u64>) -> bool {
    users
        .iter()
        .filter(|u| Some(u.id) != except)
        .any(|u| u.email.eq_ignore_ascii_case(email))
}

fn email_conflict() -> MeshError {
    MeshError::Conflict("Email already exists".to_string())
}

/// User store
pub struct UserStore {
    records: RecordStore<User>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            records: RecordStore::new(),
        }
    }

    /// Create a store holding the sample users
    pub fn seeded() -> Self {
        Self::with_records(seed(Utc::now()))
    }

    pub fn with_records(users: Vec<User>) -> Self {
        Self {
            records: RecordStore::with_records(users),
        }
    }

    /// Register a user
    pub async fn create(&self, req: NewUser) -> MeshResult<User> {
        req.validate()?;
        let role = match provided(req.role) {
            Some(raw) => raw.parse::<Role>()?,
            None => Role::Reader,
        };
        let name = req.name.unwrap_or_default();
        let email = req.email.unwrap_or_default().trim().to_string();
        let bio = provided(req.bio)
            .unwrap_or_else(|| format!("{} at Blog Microservices", role.title()));
        let now = Utc::now();

        self.records
            .insert(|id, users| {
                if email_taken(users, &email, None) {
                    return Err(email_conflict());
                }

                Ok(User {
                    id,
                    profile_picture: profile_picture_for(&name),
                    name,
                    email,
                    role,
                    bio,
                    created_at: now,
                    last_active: now,
                    updated_at: None,
                })
            })
            .await
    }

    pub async fn get(&self, id: u64) -> MeshResult<User> {
        self.records.get(id).await
    }

    pub async fn exists(&self, id: u64) -> bool {
        self.records.contains(id).await
    }

    /// List users, optionally narrowed by role and by recent activity
    pub async fn list(
        &self,
        role: Option<Role>,
        active_since: Option<DateTime<Utc>>,
    ) -> Vec<User> {
        self.records
            .list_where(|u| {
                role.map_or(true, |r| u.role == r)
                    && active_since.map_or(true, |cutoff| u.last_active > cutoff)
            })
            .await
    }

    pub async fn len(&self) -> usize {
        self.records.len().await
    }

    /// Apply a partial update. A changed email must not belong to another user.
    pub async fn update(&self, id: u64, patch: UserPatch) -> MeshResult<User> {
        let patch = UserPatch {
            name: provided(patch.name),
            email: provided(patch.email).map(|e| e.trim().to_string()),
            role: provided(patch.role),
            bio: provided(patch.bio),
        };
        patch.validate()?;

        let UserPatch {
            name,
            email,
            role,
            bio,
        } = patch;
        let role = role.map(|r| r.parse::<Role>()).transpose()?;

        self.records
            .update(id, |user, users| {
                if let Some(email) = email {
                    if email_taken(users, &email, Some(user.id)) {
                        return Err(email_conflict());
                    }
                    user.email = email;
                }
                if let Some(name) = name {
                    user.name = name;
                }
                if let Some(role) = role {
                    user.role = role;
                }
                if let Some(bio) = bio {
                    user.bio = bio;
                }
                user.updated_at = Some(Utc::now());
                Ok(())
            })
            .await
    }

    /// Mark the user as active now, returning the new timestamp
    pub async fn touch_activity(&self, id: u64) -> MeshResult<DateTime<Utc>> {
        let user = self
            .records
            .update(id, |user, _| {
                user.last_active = Utc::now();
                Ok(())
            })
            .await?;
        Ok(user.last_active)
    }

    pub async fn delete(&self, id: u64) -> MeshResult<User> {
        self.records.remove(id).await
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> UserStats {
        UserStats::from_records(&self.records.list().await, now)
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn seed(now: DateTime<Utc>) -> Vec<User> {
    let user = |id: u64,
                name: &str,
                email: &str,
                role: Role,
                created_days_ago: i64,
                active_mins_ago: i64,
                avatar_seed: &str,
                bio: &str| User {
        id,
        name: name.to_string(),
        email: email.to_string(),
        role,
        bio: bio.to_string(),
        created_at: now - Duration::days(created_days_ago),
        last_active: now - Duration::minutes(active_mins_ago),
        updated_at: None,
        profile_picture: profile_picture_for(avatar_seed),
    };

    vec![
        user(1, "John Doe", "john.doe@example.com", Role::Admin, 30, 0, "John",
            "Full-stack developer passionate about microservices and cloud architecture."),
        user(2, "Jane Smith", "jane.smith@example.com", Role::Author, 20, 60, "Jane",
            "DevOps engineer and technical writer specializing in Kubernetes and service mesh."),
        user(3, "Mike Johnson", "mike.johnson@example.com", Role::Author, 10, 120, "Mike",
            "Cloud architect with expertise in container orchestration and microservices design."),
        user(4, "Alice Brown", "alice.brown@example.com", Role::Reader, 5, 30, "Alice",
            "Software engineer learning about modern cloud-native technologies."),
        user(5, "Bob Wilson", "bob.wilson@example.com", Role::Reader, 2, 15, "Bob",
            "Backend developer interested in scalable system design and best practices."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            role: None,
            bio: None,
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let store = UserStore::seeded();
        let user = store
            .create(new_user("Grace Hopper", "grace@example.com"))
            .await
            .unwrap();

        assert_eq!(user.id, 6);
        assert_eq!(user.role, Role::Reader);
        assert_eq!(user.bio, "Reader at Blog Microservices");
        assert_eq!(user.created_at, user.last_active);
        assert!(user.profile_picture.ends_with("seed=GraceHopper"));
    }

    #[tokio::test]
    async fn test_duplicate_email_on_create() {
        let store = UserStore::seeded();
        let err = store
            .create(new_user("Imposter", "Jane.Smith@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, MeshError::Conflict(_)));
        assert_eq!(store.len().await, 5);

        // The rejected create must not burn an id
        let next = store
            .create(new_user("Someone", "someone@example.com"))
            .await
            .unwrap();
        assert_eq!(next.id, 6);
    }

    #[tokio::test]
    async fn test_duplicate_email_on_update() {
        let store = UserStore::seeded();
        let err = store
            .update(
                4,
                UserPatch {
                    email: Some("bob.wilson@example.com".to_string()),
                    name: Some("Changed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::Conflict(_)));

        let alice = store.get(4).await.unwrap();
        assert_eq!(alice.name, "Alice Brown");
        assert_eq!(alice.email, "alice.brown@example.com");
        assert!(alice.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_update_rejects_malformed_email() {
        let store = UserStore::seeded();
        let err = store
            .update(
                5,
                UserPatch {
                    email: Some("not-an-email".to_string()),
                    bio: Some("Changed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MeshError::Validation(_)));

        let bob = store.get(5).await.unwrap();
        assert_eq!(bob.email, "bob.wilson@example.com");
        assert!(bob.updated_at.is_none());

        // A blank email is treated as absent
        let user = store
            .update(
                5,
                UserPatch {
                    email: Some("   ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(user.email, "bob.wilson@example.com");
    }

    #[tokio::test]
    async fn test_update_keeping_own_email() {
        let store = UserStore::seeded();
        let user = store
            .update(
                2,
                UserPatch {
                    email: Some("jane.smith@example.com".to_string()),
                    role: Some("admin".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(user.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let store = UserStore::new();
        let mut req = new_user("Max", "max@example.com");
        req.role = Some("overlord".to_string());
        assert!(matches!(
            store.create(req).await,
            Err(MeshError::Validation(_))
        ));

        assert!(matches!(
            store.create(new_user("Max", "not-an-email")).await,
            Err(MeshError::Validation(_))
        ));
        assert!(matches!(
            store.create(NewUser::default()).await,
            Err(MeshError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let store = UserStore::seeded();
        let now = Utc::now();

        let authors = store.list(Some(Role::Author), None).await;
        assert_eq!(authors.len(), 2);

        let active = store.list(None, Some(now - Duration::hours(1))).await;
        let ids: Vec<u64> = active.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 4, 5]);
    }

    #[tokio::test]
    async fn test_touch_activity() {
        let store = UserStore::seeded();
        let before = store.get(3).await.unwrap().last_active;
        let after = store.touch_activity(3).await.unwrap();
        assert!(after > before);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("reader").unwrap(), Role::Reader);
        assert!(Role::from_str("guest").is_err());
    }
}
