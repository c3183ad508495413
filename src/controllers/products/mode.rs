use serde::Serialize;

/// The CRUD operation requested for one page load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Mode {
    #[serde(rename = "DSP")]
    Display,
    #[serde(rename = "INS")]
    Insert,
    #[serde(rename = "UPD")]
    Update,
    #[serde(rename = "DEL")]
    Delete,
}

impl Mode {
    pub fn from_code(code: &str) -> Option<Mode> {
        match code {
            "DSP" => Some(Mode::Display),
            "INS" => Some(Mode::Insert),
            "UPD" => Some(Mode::Update),
            "DEL" => Some(Mode::Delete),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Mode::Display => "DSP",
            Mode::Insert => "INS",
            Mode::Update => "UPD",
            Mode::Delete => "DEL",
        }
    }

    pub fn form_title(&self, product_id: i32, product_name: &str) -> String {
        match self {
            Mode::Display => format!("Detalle de {} {}", product_id, product_name),
            Mode::Insert => "Nuevo Producto".to_string(),
            Mode::Update => format!("Editar {} {}", product_id, product_name),
            Mode::Delete => format!("Eliminar {} {}", product_id, product_name),
        }
    }

    /// Every mode but INSERT works on an existing row.
    pub fn needs_existing(&self) -> bool {
        *self != Mode::Insert
    }

    pub fn accepts_edits(&self) -> bool {
        matches!(self, Mode::Insert | Mode::Update)
    }

    pub fn is_read_only(&self) -> bool {
        !self.accepts_edits()
    }

    pub fn shows_commit_button(&self) -> bool {
        *self != Mode::Display
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_known_codes() {
        for mode in [Mode::Display, Mode::Insert, Mode::Update, Mode::Delete] {
            assert_eq!(Mode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(Mode::from_code("dsp"), None);
        assert_eq!(Mode::from_code("DISPLAY"), None);
        assert_eq!(Mode::from_code(""), None);
    }

    #[test]
    fn titles_follow_the_mode() {
        assert_eq!(Mode::Display.form_title(7, "Lamp"), "Detalle de 7 Lamp");
        assert_eq!(Mode::Insert.form_title(0, ""), "Nuevo Producto");
        assert_eq!(Mode::Update.form_title(7, "Lamp"), "Editar 7 Lamp");
        assert_eq!(Mode::Delete.form_title(7, "Lamp"), "Eliminar 7 Lamp");
    }

    #[test]
    fn ui_flags() {
        assert!(Mode::Display.is_read_only());
        assert!(Mode::Delete.is_read_only());
        assert!(!Mode::Update.is_read_only());
        assert!(!Mode::Display.shows_commit_button());
        assert!(Mode::Delete.shows_commit_button());
        assert!(!Mode::Insert.needs_existing());
    }
}
