use std::collections::HashMap;

use log::{debug, info};

use crate::appointment::Appointment;
use crate::backend::{CreateError, FindError};
use crate::user::User;

/// Accounts and booked appointments, held for the lifetime of the process.
#[derive(Default)]
pub struct Backend {
    users: HashMap<String, User>,
    appointments: HashMap<String, Vec<Appointment>>,
}

impl Backend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend {
    pub fn find_user(&self, username: &str) -> Result<&User, FindError> {
        self.users.get(username).ok_or(FindError::NotFound)
    }

    /// Existing accounts are never replaced.
    pub fn create_user(&mut self, user: User) -> Result<(), CreateError> {
        if self.users.contains_key(&user.username) {
            return Err(CreateError::Exists);
        }

        info!("created user {}", user.username);
        self.users.insert(user.username.clone(), user);
        Ok(())
    }
}

impl Backend {
    /// Creates an empty ledger for `username` unless one exists.
    pub fn init_appointments(&mut self, username: &str) {
        if !self.appointments.contains_key(username) {
            debug!("{username}: new ledger");
            self.appointments.insert(username.into(), vec![]);
        }
    }

    pub fn add_appointments(&mut self, username: &str, new: Vec<Appointment>) -> usize {
        let count = new.len();

        self.appointments
            .entry(username.into())
            .or_default()
            .extend(new);

        count
    }

    pub fn appointments(&self, username: &str) -> &[Appointment] {
        self.appointments
            .get(username)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
