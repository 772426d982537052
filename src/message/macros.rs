/// Defines a registry-backed wire enum.
///
/// Every listed variant maps to one code point. Anything else decodes to
/// `Unknown` carrying the raw value, so re-encoding never loses information.
/// The generated type gets `from_u8`/`as_u8` or `from_u16`/`as_u16` to match
/// its width, plus a nom `parse`.
macro_rules! wire_enum {
    (
        @define $(#[$meta:meta])* $vis:vis $name:ident, $uint:ty, $from:ident, $as:ident, $reader:ident,
        { $( $(#[$vmeta:meta])* $var:ident = $val:literal ),* }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $var, )*
            Unknown($uint),
        }

        impl $name {
            pub fn $from(value: $uint) -> Self {
                match value {
                    $( $val => $name::$var, )*
                    _ => $name::Unknown(value),
                }
            }

            pub fn $as(&self) -> $uint {
                match self {
                    $( $name::$var => $val, )*
                    $name::Unknown(value) => *value,
                }
            }

            pub fn parse(input: &[u8]) -> nom::IResult<&[u8], $name> {
                let (input, value) = nom::number::complete::$reader(input)?;
                Ok((input, $name::$from(value)))
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: u8 {
            $( $(#[$vmeta:meta])* $var:ident = $val:literal ),* $(,)?
        }
    ) => {
        wire_enum!(@define $(#[$meta])* $vis $name, u8, from_u8, as_u8, be_u8,
            { $( $(#[$vmeta])* $var = $val ),* });
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: u16 {
            $( $(#[$vmeta:meta])* $var:ident = $val:literal ),* $(,)?
        }
    ) => {
        wire_enum!(@define $(#[$meta])* $vis $name, u16, from_u16, as_u16, be_u16,
            { $( $(#[$vmeta])* $var = $val ),* });
    };
}
