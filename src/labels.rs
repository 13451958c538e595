use crate::models::Category;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub emoji: String,
    pub name: String,
}

impl Label {
    fn new(emoji: &str, name: &str) -> Self {
        Self {
            emoji: emoji.to_string(),
            name: name.to_string(),
        }
    }
}

/// Display names and glyphs per category. Unknown categories borrow the
/// fallback glyph and show their raw key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelTable {
    pub beer: Label,
    pub wine: Label,
    pub liquor: Label,
    pub smoking: Label,
    pub fallback: Label,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self {
            beer: Label::new("🍺", "Beer"),
            wine: Label::new("🍷", "Wine"),
            liquor: Label::new("🥃", "Liquor"),
            smoking: Label::new("🚬", "Smoking"),
            fallback: Label::new("📝", "Other"),
        }
    }
}

impl LabelTable {
    pub fn label(&self, category: &Category) -> Label {
        match category {
            Category::Beer => self.beer.clone(),
            Category::Wine => self.wine.clone(),
            Category::Liquor => self.liquor.clone(),
            Category::Smoking => self.smoking.clone(),
            Category::Unknown(raw) => Label {
                emoji: self.fallback.emoji.clone(),
                name: if raw.is_empty() {
                    self.fallback.name.clone()
                } else {
                    raw.clone()
                },
            },
        }
    }

    /// Applies overrides of the form `beer=🍺:Beer;wine=🍷:Wine`. The name is
    /// optional; `other` targets the fallback.
    pub fn with_overrides(mut self, overrides: &str) -> Result<Self, String> {
        for item in overrides.split(';').map(str::trim).filter(|item| !item.is_empty()) {
            let (key, value) = item
                .split_once('=')
                .ok_or_else(|| format!("label override '{item}' must look like key=emoji:Name"))?;
            let (emoji, name) = match value.split_once(':') {
                Some((emoji, name)) => (emoji.trim(), Some(name.trim())),
                None => (value.trim(), None),
            };
            let slot = match key.trim().to_ascii_lowercase().as_str() {
                "other" | "unknown" => &mut self.fallback,
                raw => match Category::parse(raw) {
                    Category::Beer => &mut self.beer,
                    Category::Wine => &mut self.wine,
                    Category::Liquor => &mut self.liquor,
                    Category::Smoking => &mut self.smoking,
                    Category::Unknown(raw) => {
                        return Err(format!("unknown category '{raw}' in label overrides"));
                    }
                },
            };
            if !emoji.is_empty() {
                slot.emoji = emoji.to_string();
            }
            if let Some(name) = name.filter(|name| !name.is_empty()) {
                slot.name = name.to_string();
            }
        }
        Ok(self)
    }
}
