use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::TxnType;

/// Keywords this short only match whole words ("ara" must not hit "tarjeta").
const SHORT_KEYWORD_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: String,
    pub keywords: Vec<String>,
    /// Higher wins when several categories match. Catch-all categories such as
    /// plain transfers sit below the specific ones.
    #[serde(default)]
    pub priority: i32,
}

/// Category taxonomy plus the keyword thesaurus used to auto-categorize
/// free-text descriptions and raw category labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDictionary {
    pub rules: Vec<KeywordRule>,
    pub expense_categories: Vec<String>,
    pub income_categories: Vec<String>,
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_fallback() -> String {
    "Otros".to_string()
}

fn rule(category: &str, priority: i32, keywords: &[&str]) -> KeywordRule {
    KeywordRule {
        category: category.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        priority,
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for CategoryDictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryDictionary {
    /// The stock Spanish-language taxonomy for Colombian bank exports.
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                // Expenses
                rule("Alimentación", 0, &[
                    "restaurante", "rappi", "didi food", "comida", "almuerzo", "cena", "burger",
                    "pizza", "mc donalds", "kfc", "corral", "frisby",
                ]),
                rule("Mercado", 0, &[
                    "exito", "carulla", "d1", "ara", "jumbo", "olimpica", "mercado", "tienda",
                    "supermercado", "oxxo",
                ]),
                rule("Transporte", 0, &[
                    "uber", "didi", "cabify", "ticket", "pasaje", "bus", "transmilenio", "metro",
                    "gasolina", "terpel", "primax", "parqueadero",
                ]),
                rule("Salud", 0, &[
                    "drogueria", "farmacia", "medico", "consultas", "salud", "eps", "cruz verde",
                    "doctors", "hospital",
                ]),
                rule("Vivienda", 0, &[
                    "arriendo", "administracion", "servicios", "luz", "agua", "gas", "internet",
                    "claro", "movistar", "tigo", "homecenter", "etb",
                ]),
                rule("Entretenimiento", 0, &[
                    "netflix", "spotify", "cine", "tiquetes", "concierto", "juegos", "steam",
                    "playstation", "prime video", "hbomax", "disney",
                ]),
                rule("Bancos", 0, &[
                    "cuota manejo", "intereses", "seguro tarjeta", "bancolombia", "transaccion",
                    "comision",
                ]),
                rule("Retiros", 0, &["retiro", "cajero"]),
                rule("Transferencias", -1, &[
                    "nequi", "transfiya", "daviplata", "transferencia", "abono a cuenta",
                ]),
                // Income
                rule("Salario", 0, &["nomina", "nomi", "salario", "sueldo", "pago de nomina", "honorarios"]),
                rule("Ventas", 0, &["venta", "pago recibido"]),
                rule("Inversión", 0, &["rendimientos", "fiducuenta", "dividendos"]),
            ],
            expense_categories: names(&[
                "Alimentación", "Transporte", "Vivienda", "Entretenimiento", "Salud", "Ahorro",
                "Otros", "Mercado", "Bancos", "Retiros",
            ]),
            income_categories: names(&["Salario", "Ventas", "Regalo", "Inversión", "Otros"]),
            fallback: default_fallback(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, format!("{json}\n"))?;
        Ok(())
    }

    /// Every known category name, expense list first, without repeats.
    pub fn all_categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        let all = self
            .expense_categories
            .iter()
            .chain(&self.income_categories)
            .chain(self.rules.iter().map(|r| &r.category));
        for name in all {
            if !seen.contains(&name.as_str()) {
                seen.push(name);
            }
        }
        seen
    }

    /// Category for a bank-statement description, or the fallback.
    pub fn categorize(&self, description: &str) -> String {
        self.best_match(&fold(description))
            .map(|r| r.category.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// Map a user-supplied category label onto the taxonomy. Unknown labels
    /// are kept, with the first letter upper-cased.
    pub fn normalize_category(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            return self.fallback.clone();
        }
        let folded = fold(raw);
        if let Some(known) = self.all_categories().into_iter().find(|c| fold(c) == folded) {
            return known.to_string();
        }
        if let Some(r) = self.best_match(&folded) {
            return r.category.clone();
        }
        capitalize(raw)
    }

    /// Income only for categories in the income list that are not also
    /// expenses; everything else, including unknown labels, is an expense.
    pub fn infer_type(&self, category: &str) -> TxnType {
        let folded = fold(category);
        let listed = |list: &[String]| list.iter().any(|c| fold(c) == folded);
        if listed(&self.expense_categories) {
            TxnType::Expense
        } else if listed(&self.income_categories) {
            TxnType::Income
        } else {
            TxnType::Expense
        }
    }

    /// Highest priority wins, then the longest matching keyword, then the
    /// rule declared first.
    fn best_match(&self, folded: &str) -> Option<&KeywordRule> {
        let mut best: Option<(i32, usize, &KeywordRule)> = None;
        for r in &self.rules {
            let Some(len) = r
                .keywords
                .iter()
                .map(|k| fold(k))
                .filter(|k| keyword_matches(folded, k))
                .map(|k| k.chars().count())
                .max()
            else {
                continue;
            };
            let better = match best {
                None => true,
                Some((p, l, _)) => r.priority > p || (r.priority == p && len > l),
            };
            if better {
                best = Some((r.priority, len, r));
            }
        }
        best.map(|(_, _, r)| r)
    }
}

fn keyword_matches(text: &str, keyword: &str) -> bool {
    if keyword.is_empty() {
        return false;
    }
    if keyword.chars().count() > SHORT_KEYWORD_LEN {
        return text.contains(keyword);
    }
    text.match_indices(keyword).any(|(i, _)| {
        let before = text[..i].chars().next_back();
        let after = text[i + keyword.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Lower-case and strip Spanish diacritics so "DROGUERÍA" matches "drogueria".
pub fn fold(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
