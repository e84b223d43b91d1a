use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub background: String,
    pub edge_color: String,
    pub edge_opacity: f32,
    pub edge_width: f32,
    pub node_color: String,
    pub node_radius: f32,
    pub font_family: String,
    pub font_size: f32,
    pub label_color: String,
}

impl Theme {
    /// Translucent blue strands on white, so dense bundles darken.
    pub fn classic() -> Self {
        Self {
            background: "#FFFFFF".to_string(),
            edge_color: "#0000E6".to_string(),
            edge_opacity: 0.1,
            edge_width: 0.7,
            node_color: "#0000FF".to_string(),
            node_radius: 3.5,
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 9.0,
            label_color: "#1C2430".to_string(),
        }
    }

    pub fn night() -> Self {
        Self {
            background: "#0B1020".to_string(),
            edge_color: "#7FD3FF".to_string(),
            edge_opacity: 0.18,
            edge_width: 0.6,
            node_color: "#FFD166".to_string(),
            node_radius: 2.5,
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 9.0,
            label_color: "#E6ECF5".to_string(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "classic" | "default" => Some(Self::classic()),
            "night" | "dark" => Some(Self::night()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
