mod common;

use assert2::{check, let_assert};
use catalog_mcp::catalog::ListingQuery;
use catalog_mcp::tools::categories::{ListCategoriesRequest, handle_list_categories};
use catalog_mcp::tools::products::{
    CreateProductRequest, ListProductsRequest, ProductIdRequest, UpdateProductRequest,
    handle_create_product, handle_delete_product, handle_list_products, handle_update_product,
};
use common::{IsolatedCatalog, empty_catalog, isolated_catalog};
use rstest::rstest;

fn teapot() -> CreateProductRequest {
    CreateProductRequest {
        name: "Cast Iron Teapot".to_string(),
        description: "Keeps tea warm".to_string(),
        price: "42".to_string(),
        category: Some("Kitchen".to_string()),
        stock: Some("3".to_string()),
        image_url: None,
    }
}

#[rstest]
#[tokio::test]
async fn created_products_are_persisted(empty_catalog: IsolatedCatalog) {
    handle_create_product(&empty_catalog.state, teapot())
        .await
        .unwrap();

    let persisted = empty_catalog.persisted();
    check!(persisted.len() == 1);
    check!(persisted[0].name == "Cast Iron Teapot");
    check!(persisted[0].stock == 3);
    check!(persisted[0].category.as_deref() == Some("Kitchen"));
}

#[rstest]
#[tokio::test]
async fn invalid_form_is_not_persisted(empty_catalog: IsolatedCatalog) {
    let request = CreateProductRequest {
        price: "free".to_string(),
        ..teapot()
    };

    let_assert!(Err(message) = handle_create_product(&empty_catalog.state, request).await);
    check!(message.contains("price must be a valid non-negative number"));
    check!(empty_catalog.persisted().is_empty());
}

#[rstest]
#[tokio::test]
async fn listing_reflects_updates(isolated_catalog: IsolatedCatalog) {
    let state = &isolated_catalog.state;
    let query = ListingQuery::new("stool");
    check!(state.listing(&query).await.len() == 1);

    let update = UpdateProductRequest {
        id: "p08".to_string(),
        name: Some("Bar Chair".to_string()),
        ..UpdateProductRequest::default()
    };
    handle_update_product(state, update).await.unwrap();

    check!(state.listing(&query).await.is_empty());
    let persisted = isolated_catalog.persisted();
    let_assert!(Some(chair) = persisted.iter().find(|p| p.id.as_str() == "p08"));
    check!(chair.name == "Bar Chair");
    check!(chair.price == 75.0);
}

#[rstest]
#[tokio::test]
async fn admin_list_is_newest_first_and_paged(isolated_catalog: IsolatedCatalog) {
    let request = ListProductsRequest {
        page: Some(1),
        page_size: Some(4),
        query: None,
    };

    let output = handle_list_products(&isolated_catalog.state, request)
        .await
        .unwrap();

    check!(output.starts_with("Products (12 total, page 1 of 3)"));
    check!(output.contains("1. `Coffee Table`"));
    check!(output.contains("3. `Bookshelf`"));
    check!(!output.contains("Pendant Light"));
    check!(output.contains("Pages: [1] 2 3"));
}

#[rstest]
#[tokio::test]
async fn admin_list_filters_by_name_only(isolated_catalog: IsolatedCatalog) {
    let request = ListProductsRequest {
        query: Some("TABLE".to_string()),
        ..ListProductsRequest::default()
    };

    let output = handle_list_products(&isolated_catalog.state, request)
        .await
        .unwrap();

    check!(output.starts_with("Products (4 total"));
    check!(!output.contains("Linen Cushion"));
}

#[rstest]
#[tokio::test]
async fn delete_removes_product_and_uploaded_image(empty_catalog: IsolatedCatalog) {
    let state = &empty_catalog.state;
    let url = state
        .images()
        .upload(b"\x89PNG", "teapot.png", "image/png", None)
        .await
        .unwrap();

    let request = CreateProductRequest {
        image_url: Some(url.clone()),
        ..teapot()
    };
    handle_create_product(state, request).await.unwrap();
    let id = empty_catalog.persisted()[0].id.to_string();

    let object = state.images().object_path_from_url(&url).unwrap();
    let image_path = empty_catalog
        .root()
        .join("images")
        .join(state.images().bucket())
        .join(object);
    check!(image_path.exists());

    let output = handle_delete_product(state, ProductIdRequest { id })
        .await
        .unwrap();

    check!(output.contains("Removed its image."));
    check!(!image_path.exists());
    check!(empty_catalog.persisted().is_empty());
}

#[rstest]
#[tokio::test]
async fn delete_keeps_foreign_images(isolated_catalog: IsolatedCatalog) {
    let update = UpdateProductRequest {
        id: "p05".to_string(),
        image_url: Some("https://elsewhere.example.com/rug.jpg".to_string()),
        ..UpdateProductRequest::default()
    };
    handle_update_product(&isolated_catalog.state, update)
        .await
        .unwrap();

    let output = handle_delete_product(
        &isolated_catalog.state,
        ProductIdRequest {
            id: "p05".to_string(),
        },
    )
    .await
    .unwrap();

    check!(output == "Deleted product `Wool Rug` (p05).\n");
}

#[rstest]
#[tokio::test]
async fn categories_in_first_seen_order(isolated_catalog: IsolatedCatalog) {
    let output = handle_list_categories(&isolated_catalog.state, ListCategoriesRequest::default())
        .await
        .unwrap();
    check!(output == "Categories (3):\n  • Furniture\n  • Lighting\n  • Textiles\n");
}
