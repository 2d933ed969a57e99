//! Macros to reduce boilerplate in layer implementations

/// Implements the [`Layer`](crate::layers::base::Layer) accessors backed by a
/// [`LayerProperties`](crate::layers::base::LayerProperties) field:
/// `id`, `name`, `layer_type`, `is_visible`, `set_visible`, `as_any` and
/// `as_any_mut`.
///
/// Usage inside an `impl Layer for MyLayer` block:
/// ```ignore
/// cachemap::impl_layer_trait!(properties);
/// ```
#[macro_export]
macro_rules! impl_layer_trait {
    ($properties_field:ident) => {
        fn id(&self) -> &str {
            &self.$properties_field.id
        }

        fn name(&self) -> &str {
            &self.$properties_field.name
        }

        fn layer_type(&self) -> $crate::layers::base::LayerType {
            self.$properties_field.layer_type
        }

        fn is_visible(&self) -> bool {
            self.$properties_field.visible
        }

        fn set_visible(&mut self, visible: bool) {
            self.$properties_field.visible = visible;
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}
