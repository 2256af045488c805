//! Register User Use Case
//!
//! Creates the identity record results and aggregates hang off.
//! Credentials and sessions belong to the auth service.

use std::sync::Arc;

use crate::domain::entities::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_objects::UserName;
use crate::error::{DewordleError, DewordleResult};

pub struct RegisterUserInput {
    pub user_name: String,
}

pub struct RegisterUserUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> RegisterUserUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, input: RegisterUserInput) -> DewordleResult<User> {
        let user_name = UserName::new(input.user_name)
            .map_err(|e| DewordleError::InvalidInput(e.to_string()))?;

        // Fast path; the unique index still decides races
        if self.user_repo.exists_by_user_name(&user_name).await? {
            return Err(DewordleError::UserNameTaken);
        }

        let user = User::new(user_name);
        self.user_repo.create(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            "User registered"
        );

        Ok(user)
    }
}
