use serde::{Deserialize, Serialize};

/// What a folded constant looks like when the unfolded expression still had
/// an untyped result.
///
/// Index expressions always have a concrete result type (the element type,
/// `uint8` for strings, the map value type), so both modes fold them to the
/// same typed literal. The mode only matters to callers of
/// [`fold_constant`](crate::compile::fold_constant) with untyped closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldMode {
    /// Keep the folded constant untyped so later context can still coerce it.
    #[default]
    KeepUntyped,
    /// Fix the folded constant to the expression's result type.
    Typed,
}

/// Compiler switches, loadable from a TOML `[compile]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Replace index expressions whose operands are both constant with
    /// their value.
    pub fold_constants: bool,
    pub fold_mode: FoldMode,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            fold_constants: true,
            fold_mode: FoldMode::KeepUntyped,
        }
    }
}

impl CompileOptions {
    pub fn without_folding() -> Self {
        Self {
            fold_constants: false,
            ..Self::default()
        }
    }
}
