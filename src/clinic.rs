use std::path::PathBuf;
use std::{result, sync::Arc};

use log::{error, info, trace, warn};
use tokio::sync::Mutex;
use warp::http;

use crate::appointment::{Appointment, Booking};
use crate::backend::{Backend, CreateError};
use crate::files::FileAreas;
use crate::pdf;
use crate::session::{Category, Flash, SessionId, Sessions};
use crate::user::{Credentials, Registration};

pub struct Clinic {
    backend: Mutex<Backend>,
    sessions: Mutex<Sessions>,
    files: FileAreas,
    export_dir: PathBuf,
    secure: bool,
}

/// A request from some browser, logged in or not.
pub struct Visit {
    clinic: Arc<Clinic>,
    session_id: SessionId,
    fresh: bool,
}

/// A visit whose session is bound to a user.
pub struct VisitAuthed {
    visit: Visit,
    username: String,
}

pub struct Export {
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Copy, Clone, Debug)]
pub enum Error {
    Internal,
    NotFound,
    BadRequest,
}

pub type Result<T> = result::Result<T, Error>;

impl Into<http::StatusCode> for Error {
    fn into(self) -> http::StatusCode {
        match self {
            Self::Internal => http::StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => http::StatusCode::NOT_FOUND,
            Self::BadRequest => http::StatusCode::BAD_REQUEST,
        }
    }
}

impl warp::reject::Reject for Error {}

impl Clinic {
    pub fn new(files: FileAreas, export_dir: PathBuf, secure: bool) -> Self {
        Self {
            backend: Mutex::new(Backend::new()),
            sessions: Mutex::new(Sessions::new()),
            files,
            export_dir,
            secure,
        }
    }

    pub fn files(&self) -> &FileAreas {
        &self.files
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn visit(self: &Arc<Self>, cookie: Option<&str>) -> Visit {
        let (session_id, fresh) = self.sessions.lock().await.resume(cookie);

        Visit {
            clinic: Arc::clone(self),
            session_id,
            fresh,
        }
    }

    /// Fails only for a taken username, leaving the existing account alone.
    pub async fn register(&self, registration: Registration) -> result::Result<(), CreateError> {
        let username = registration.username.clone();

        self.backend
            .lock()
            .await
            .create_user(registration.into())
            .map_err(|e| {
                warn!("registration for existing user {username}");
                e
            })
    }

    pub async fn authenticate(&self, creds: &Credentials) -> bool {
        let backend = self.backend.lock().await;

        match backend.find_user(&creds.username) {
            Ok(user) if user.password == creds.password => true,
            Ok(_) => {
                error!("wrong password for user {}", creds.username);
                false
            }
            Err(e) => {
                error!("rejecting user {}: {e:?}", creds.username);
                false
            }
        }
    }
}

impl Visit {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Whether the browser needs to be sent its session cookie.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn clinic(&self) -> &Clinic {
        &self.clinic
    }

    pub async fn flash(&self, category: Category, message: &'static str) {
        self.clinic
            .sessions
            .lock()
            .await
            .flash(self.session_id, category, message);
    }

    pub async fn take_flashes(&self) -> Vec<Flash> {
        self.clinic.sessions.lock().await.take_flashes(self.session_id)
    }

    pub async fn authed(self) -> result::Result<VisitAuthed, Visit> {
        let username = self
            .clinic
            .sessions
            .lock()
            .await
            .current(self.session_id)
            .map(str::to_string);

        match username {
            Some(username) => Ok(VisitAuthed {
                visit: self,
                username,
            }),
            None => {
                trace!("session {} isn't logged in", self.session_id);
                Err(self)
            }
        }
    }

    pub async fn login(self, creds: Credentials) -> result::Result<VisitAuthed, Visit> {
        if !self.clinic.authenticate(&creds).await {
            return Err(self);
        }

        let username = creds.username;

        self.clinic.backend.lock().await.init_appointments(&username);
        self.clinic
            .sessions
            .lock()
            .await
            .start(self.session_id, &username);

        info!("{username} login");
        Ok(VisitAuthed {
            visit: self,
            username,
        })
    }

    pub async fn logout(&self) {
        if let Some(username) = self.clinic.sessions.lock().await.end(self.session_id) {
            info!("{username} logout");
        }
    }
}

impl VisitAuthed {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn visit(&self) -> &Visit {
        &self.visit
    }

    pub async fn book(&self, booking: Booking) -> usize {
        let username = &self.username;
        let appointments = booking.into_appointments();

        let count = self
            .visit
            .clinic
            .backend
            .lock()
            .await
            .add_appointments(username, appointments);

        info!("{username} booked {count} appointments");
        count
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.visit
            .clinic
            .backend
            .lock()
            .await
            .appointments(&self.username)
            .to_vec()
    }

    /// `None` when there's nothing booked, in which case no file is written.
    pub async fn export_pdf(&self) -> Result<Option<Export>> {
        let username = &self.username;
        let appointments = self.appointments().await;

        if appointments.is_empty() {
            info!("{username} export: no appointments");
            return Ok(None);
        }

        let data = pdf::render(username, &appointments).map_err(|e| {
            error!("couldn't render pdf for {username}: {e:?}");
            Error::Internal
        })?;

        let filename = pdf::filename(username);
        let path = self.visit.clinic.export_dir.join(&filename);

        tokio::fs::write(&path, &data).await.map_err(|e| {
            error!("couldn't write {path:?}: {e}");
            Error::Internal
        })?;

        info!(
            "{username} exported {} appointments to {path:?}",
            appointments.len()
        );
        Ok(Some(Export { filename, data }))
    }
}
