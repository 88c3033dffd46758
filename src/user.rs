use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl From<Registration> for User {
    fn from(reg: Registration) -> Self {
        let Registration {
            username,
            password,
            email,
        } = reg;

        Self {
            username,
            password,
            email,
        }
    }
}
