pub mod books;
pub mod demo;
pub mod reviews;

use shelf_kernel::ModuleRegistry;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry) {
    registry.register(books::create_module());
    registry.register(reviews::create_module());
    registry.register(demo::create_module());
}
