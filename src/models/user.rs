use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserInfo {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Usuario")
    }

    pub fn role_label(&self) -> String {
        match self.role.as_deref() {
            Some("walker") => "Paseador".to_string(),
            Some(role) => role.to_string(),
            None => "Rol".to_string(),
        }
    }
}
