/// Element type tags recognized by the codecs, with the fixed width (in
/// bytes) of one element. Variable-length binary types report `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Bool,
    Tiny,
    UTiny,
    Small,
    USmall,
    Int,
    UInt,
    Big,
    UBig,
    Float,
    Double,
    Timestamp,
    Binary,
}

impl ElementType {
    /// Fixed byte width for scalar types; `None` for variable-length binary.
    pub fn fixed_width(self) -> Option<usize> {
        use ElementType::*;
        match self {
            Bool | Tiny | UTiny => Some(1),
            Small | USmall => Some(2),
            Int | UInt | Float => Some(4),
            Big | UBig | Double | Timestamp => Some(8),
            Binary => None,
        }
    }

    pub fn is_integer(self) -> bool {
        use ElementType::*;
        matches!(self, Tiny | UTiny | Small | USmall | Int | UInt | Big | UBig)
    }
}
