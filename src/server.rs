//! MCP server exposing the catalog as tools.

use crate::state::CatalogState;
use crate::tools::categories::{ListCategoriesRequest, handle_list_categories};
use crate::tools::products::{
    CreateProductRequest, ListProductsRequest, ProductIdRequest, UpdateProductRequest,
    handle_create_product, handle_delete_product, handle_get_product, handle_list_products,
    handle_update_product,
};
use crate::tools::search::{SearchProductsRequest, handle_search_products};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// MCP server for storefront catalog queries and management
#[derive(Clone)]
pub struct CatalogServer {
    /// Shared catalog state (store, images, listing cache)
    state: Arc<CatalogState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for CatalogServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl CatalogServer {
    pub fn new(state: Arc<CatalogState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    pub fn state(&self) -> &Arc<CatalogState> {
        &self.state
    }

    #[tool(
        description = "Search the product catalog like the storefront does. Matches the query against product names and descriptions (case-insensitive), optionally restricted to a category and sorted by price or name. Returns one page of results with page links, or close product names when nothing matches.",
        input_schema = inline_schema_for_type::<SearchProductsRequest>()
    )]
    async fn search_products(
        &self,
        Parameters(request): Parameters<SearchProductsRequest>,
    ) -> std::result::Result<String, String> {
        handle_search_products(&self.state, request).await
    }

    #[tool(
        description = "List products newest first, optionally filtered by a name substring. Paginated.",
        input_schema = inline_schema_for_type::<ListProductsRequest>()
    )]
    async fn list_products(
        &self,
        Parameters(request): Parameters<ListProductsRequest>,
    ) -> std::result::Result<String, String> {
        handle_list_products(&self.state, request).await
    }

    #[tool(
        description = "List the distinct product categories in the catalog.",
        input_schema = inline_schema_for_type::<ListCategoriesRequest>()
    )]
    async fn list_categories(
        &self,
        Parameters(request): Parameters<ListCategoriesRequest>,
    ) -> std::result::Result<String, String> {
        handle_list_categories(&self.state, request).await
    }

    #[tool(
        description = "Show every field of one product by id.",
        input_schema = inline_schema_for_type::<ProductIdRequest>()
    )]
    async fn get_product(
        &self,
        Parameters(request): Parameters<ProductIdRequest>,
    ) -> std::result::Result<String, String> {
        handle_get_product(&self.state, request).await
    }

    #[tool(
        description = "Create a product. Name (3+ characters), description and a non-negative price are required; all validation errors are reported together.",
        input_schema = inline_schema_for_type::<CreateProductRequest>()
    )]
    async fn create_product(
        &self,
        Parameters(request): Parameters<CreateProductRequest>,
    ) -> std::result::Result<String, String> {
        handle_create_product(&self.state, request).await
    }

    #[tool(
        description = "Update some fields of a product by id. Omitted fields are left unchanged.",
        input_schema = inline_schema_for_type::<UpdateProductRequest>()
    )]
    async fn update_product(
        &self,
        Parameters(request): Parameters<UpdateProductRequest>,
    ) -> std::result::Result<String, String> {
        handle_update_product(&self.state, request).await
    }

    #[tool(
        description = "Delete a product by id, along with its image when the image is stored in the catalog bucket.",
        input_schema = inline_schema_for_type::<ProductIdRequest>()
    )]
    async fn delete_product(
        &self,
        Parameters(request): Parameters<ProductIdRequest>,
    ) -> std::result::Result<String, String> {
        handle_delete_product(&self.state, request).await
    }
}

#[tool_handler]
impl ServerHandler for CatalogServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "catalog-mcp: search and manage a storefront product catalog. \
                 Use search_products for shopper-style queries with category and sort, \
                 list_products for the admin view, and the create/update/delete tools to edit products.",
            )
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this function sets `inline_subschemas = true`
/// to generate inline enum definitions instead of $ref patterns, which MCP clients
/// render as proper form widgets.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();

    match serde_json::to_value(schema) {
        Ok(serde_json::Value::Object(object)) => Arc::new(object),
        other => {
            tracing::error!("Schema serialization produced a non-object value: {:?}", other);
            Arc::new(JsonObject::new())
        }
    }
}
