//! Type-identity seam between model types and the data-source layer.

use std::borrow::Cow;

/// A persistable domain type that resolves its data source through the
/// registry.
///
/// The only contract this crate needs from a model is a canonical name: the
/// fully-qualified identifier used for binding lookups and for the
/// unresolved-data-source message. The default uses the compiler's qualified
/// type name; override it when bindings must survive module moves or match an
/// external naming scheme.
///
/// ```
/// use ar_config::Model;
/// use std::borrow::Cow;
///
/// struct User;
///
/// impl Model for User {
///     fn model_name() -> Cow<'static, str> {
///         Cow::Borrowed("com.example.User")
///     }
/// }
///
/// assert_eq!(User::model_name(), "com.example.User");
/// ```
pub trait Model {
    /// Canonical, fully-qualified name of this model type.
    fn model_name() -> Cow<'static, str>
    where
        Self: Sized,
    {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}
