pub mod inventory_routes;
pub mod system_routes;
