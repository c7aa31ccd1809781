//! Solver settings as typed lists of named values.

use std::fmt;

/// The families of settings, each stored in its own list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingKind {
    Bool,
    Int,
    Long,
    Double,
    Char,
    String,
    /// Resource limits of the solver, such as time or node limits.
    Limit,
}

impl SettingKind {
    pub const ALL: [SettingKind; 7] = [
        SettingKind::Bool,
        SettingKind::Int,
        SettingKind::Long,
        SettingKind::Double,
        SettingKind::Char,
        SettingKind::String,
        SettingKind::Limit,
    ];
}

/// The value of one setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Char(char),
    Str(String),
    Limit(i64),
}

impl SettingValue {
    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Bool(_) => SettingKind::Bool,
            SettingValue::Int(_) => SettingKind::Int,
            SettingValue::Long(_) => SettingKind::Long,
            SettingValue::Double(_) => SettingKind::Double,
            SettingValue::Char(_) => SettingKind::Char,
            SettingValue::Str(_) => SettingKind::String,
            SettingValue::Limit(_) => SettingKind::Limit,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            SettingValue::Int(v) => write!(f, "{v}"),
            SettingValue::Long(v) | SettingValue::Limit(v) => write!(f, "{v}"),
            SettingValue::Double(v) => write!(f, "{v:?}"),
            SettingValue::Char(c) => write!(f, "'{c}'"),
            SettingValue::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Settings of a solver run.
///
/// Entries keep their insertion order, which is the order used to align them
/// with target settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    pub bool_settings: Vec<(String, bool)>,
    pub int_settings: Vec<(String, i32)>,
    pub long_settings: Vec<(String, i64)>,
    pub double_settings: Vec<(String, f64)>,
    pub char_settings: Vec<(String, char)>,
    pub string_settings: Vec<(String, String)>,
    pub limit_settings: Vec<(String, i64)>,
}

impl SolverSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, kind: SettingKind) -> usize {
        match kind {
            SettingKind::Bool => self.bool_settings.len(),
            SettingKind::Int => self.int_settings.len(),
            SettingKind::Long => self.long_settings.len(),
            SettingKind::Double => self.double_settings.len(),
            SettingKind::Char => self.char_settings.len(),
            SettingKind::String => self.string_settings.len(),
            SettingKind::Limit => self.limit_settings.len(),
        }
    }
    pub fn total_len(&self) -> usize {
        SettingKind::ALL.iter().map(|&k| self.len(k)).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Name and value of entry `index` of the list `kind`.
    pub fn get(&self, kind: SettingKind, index: usize) -> Option<(&str, SettingValue)> {
        fn entry<T: Clone>(
            list: &[(String, T)],
            index: usize,
            wrap: fn(T) -> SettingValue,
        ) -> Option<(&str, SettingValue)> {
            list.get(index)
                .map(|(name, v)| (name.as_str(), wrap(v.clone())))
        }
        match kind {
            SettingKind::Bool => entry(&self.bool_settings, index, SettingValue::Bool),
            SettingKind::Int => entry(&self.int_settings, index, SettingValue::Int),
            SettingKind::Long => entry(&self.long_settings, index, SettingValue::Long),
            SettingKind::Double => entry(&self.double_settings, index, SettingValue::Double),
            SettingKind::Char => entry(&self.char_settings, index, SettingValue::Char),
            SettingKind::String => entry(&self.string_settings, index, SettingValue::Str),
            SettingKind::Limit => entry(&self.limit_settings, index, SettingValue::Limit),
        }
    }

    /// Overwrite the value of an existing entry. Returns false if the entry
    /// does not exist or has another kind.
    pub fn set(&mut self, index: usize, value: SettingValue) -> bool {
        fn put<T>(list: &mut [(String, T)], index: usize, v: T) -> bool {
            match list.get_mut(index) {
                Some(entry) => {
                    entry.1 = v;
                    true
                }
                None => false,
            }
        }
        match value {
            SettingValue::Bool(v) => put(&mut self.bool_settings, index, v),
            SettingValue::Int(v) => put(&mut self.int_settings, index, v),
            SettingValue::Long(v) => put(&mut self.long_settings, index, v),
            SettingValue::Double(v) => put(&mut self.double_settings, index, v),
            SettingValue::Char(v) => put(&mut self.char_settings, index, v),
            SettingValue::Str(v) => put(&mut self.string_settings, index, v),
            SettingValue::Limit(v) => put(&mut self.limit_settings, index, v),
        }
    }

    /// Append an entry to the list of its kind.
    pub fn push<S: Into<String>>(&mut self, name: S, value: SettingValue) {
        let name = name.into();
        match value {
            SettingValue::Bool(v) => self.bool_settings.push((name, v)),
            SettingValue::Int(v) => self.int_settings.push((name, v)),
            SettingValue::Long(v) => self.long_settings.push((name, v)),
            SettingValue::Double(v) => self.double_settings.push((name, v)),
            SettingValue::Char(v) => self.char_settings.push((name, v)),
            SettingValue::Str(v) => self.string_settings.push((name, v)),
            SettingValue::Limit(v) => self.limit_settings.push((name, v)),
        }
    }

    /// Every entry, kind by kind.
    pub fn iter(&self) -> impl Iterator<Item = (&str, SettingValue)> + '_ {
        SettingKind::ALL.into_iter().flat_map(move |kind| {
            (0..self.len(kind)).filter_map(move |i| self.get(kind, i))
        })
    }

    /// Look a setting up by name.
    pub fn find(&self, name: &str) -> Option<SettingValue> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> SolverSettings {
        let mut s = SolverSettings::new();
        s.push("presolving/enabled", SettingValue::Bool(true));
        s.push("lp/threads", SettingValue::Int(4));
        s.push("numerics/feastol", SettingValue::Double(1e-6));
        s.push("limits/nodes", SettingValue::Limit(1000));
        s.push("branching/rule", SettingValue::Char('p'));
        s
    }

    #[test]
    fn lookup() {
        let s = example();
        assert_eq!(s.total_len(), 5);
        assert_eq!(s.len(SettingKind::Int), 1);
        assert_eq!(s.get(SettingKind::Int, 0), Some(("lp/threads", SettingValue::Int(4))));
        assert_eq!(s.get(SettingKind::Int, 1), None);
        assert_eq!(s.find("limits/nodes"), Some(SettingValue::Limit(1000)));
        assert_eq!(s.find("missing"), None);
    }

    #[test]
    fn overwrite() {
        let mut s = example();
        assert!(s.set(0, SettingValue::Bool(false)));
        assert!(!s.set(3, SettingValue::Bool(false)));
        assert_eq!(s.find("presolving/enabled"), Some(SettingValue::Bool(false)));
        assert_eq!(SettingValue::Char('p').to_string(), "'p'");
        assert_eq!(SettingValue::Double(1.0).to_string(), "1.0");
    }
}
