use proc_macro::TokenStream;

mod m_ext_repr;
mod m_packed_data;

/// Implements `lithdat::packed::PackedData` on given type.
///
/// All fields must implement `PackedData`. The generated implementation reads and writes fields
/// in order of definition, without any padding. A field that fails to decode annotates the error
/// with its name (or its position, for tuple structs).
///
/// The generated code refers to `::lithdat` and `::lithdat_utils`, so both must be reachable by
/// those names.
#[proc_macro_derive(PackedData)]
pub fn packed_data_derive(input: TokenStream) -> TokenStream {
    m_packed_data::packed_data_derive(input)
}

/// Extended `#[repr(T)]` macro for fieldless enums. Aside from invoking normal `#[repr(T)]`, it
/// generates:
///  * [`TryFrom<T>`] for converting from the repr type, failing with
///    `lithdat_utils::EnumParseError`
///  * [`From<Self>`] for the repr type
///  * `Self::ALL`, a slice of every variant in order of declaration
///  * `Self::name`, returning the variant's name
///
/// ## Example
/// ```norun
/// use lithdat_proc::ext_repr;
///
/// #[ext_repr(u8)]
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum PropertyKind {
///     String = 0,
///     Vector = 1,
///     Bool = 5,
/// }
///
/// assert_eq!(PropertyKind::try_from(5u8), Ok(PropertyKind::Bool));
/// assert!(PropertyKind::try_from(4u8).is_err());
/// assert_eq!(u8::from(PropertyKind::Vector), 1);
/// assert_eq!(PropertyKind::ALL.len(), 3);
/// assert_eq!(PropertyKind::Bool.name(), "Bool");
/// ```
#[proc_macro_attribute]
pub fn ext_repr(input: TokenStream, source_item: TokenStream) -> TokenStream {
    m_ext_repr::ext_repr(input, source_item)
}
