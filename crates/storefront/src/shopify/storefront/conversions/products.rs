//! Product and collection conversion functions.

use verger_core::{
    Collection, CollectionId, MerchandiseId, ProductDetail, ProductId, ProductImage,
    ProductSummary, ProductVariant, resolve_category,
};

use crate::shopify::storefront::queries::{
    CategoryFields, ProductSummaryFields, get_collection_by_handle, get_product_by_handle,
};

fn category_name(category: Option<&CategoryFields>) -> Option<&str> {
    category.map(|c| c.name.as_str())
}

/// Convert a listing product. Only the first image and first variant are used.
pub fn convert_product_summary(product: ProductSummaryFields) -> ProductSummary {
    let category = resolve_category(
        category_name(product.category.as_ref()),
        product.product_type.as_deref(),
    );
    let image = product.images.into_nodes().next();
    let (image, image_alt) = match image {
        Some(img) => {
            let alt = img.alt_text.unwrap_or_else(|| product.title.clone());
            (img.url, alt)
        }
        None => (String::new(), product.title.clone()),
    };

    ProductSummary {
        id: ProductId::new(product.id),
        name: product.title,
        handle: product.handle,
        description: product.description,
        price: product.price_range.min_variant_price,
        image,
        image_alt,
        variant_id: product
            .variants
            .into_nodes()
            .next()
            .map(|v| MerchandiseId::new(v.id)),
        tags: product.tags,
        category,
    }
}

/// Convert a product detail selection.
pub fn convert_product(product: get_product_by_handle::ProductFields) -> ProductDetail {
    let category = resolve_category(
        category_name(product.category.as_ref()),
        product.product_type.as_deref(),
    );
    let title = product.title;

    ProductDetail {
        id: ProductId::new(product.id),
        handle: product.handle,
        description: product.description,
        description_html: product.description_html,
        price: product.price_range.min_variant_price,
        images: product
            .images
            .into_nodes()
            .map(|img| ProductImage {
                alt: img.alt_text.unwrap_or_else(|| title.clone()),
                url: img.url,
            })
            .collect(),
        variants: product
            .variants
            .into_nodes()
            .map(|v| ProductVariant {
                id: MerchandiseId::new(v.id),
                title: v.title,
                price: v.price,
                available_for_sale: v.available_for_sale,
            })
            .collect(),
        tags: product.tags,
        category,
        name: title,
    }
}

/// Convert a collection and its products.
pub fn convert_collection(collection: get_collection_by_handle::CollectionFields) -> Collection {
    Collection {
        id: CollectionId::new(collection.id),
        title: collection.title,
        description: collection.description,
        handle: collection.handle,
        products: collection
            .products
            .into_nodes()
            .map(convert_product_summary)
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use verger_core::DEFAULT_CATEGORY;

    fn summary_json() -> serde_json::Value {
        serde_json::json!({
            "id": "gid://shopify/Product/1",
            "title": "Savon",
            "handle": "savon",
            "description": "Savon au lait d'ânesse",
            "priceRange": {"minVariantPrice": {"amount": "12.5", "currencyCode": "EUR"}},
            "images": {"edges": [{"node": {"url": "https://cdn.example/s.jpg", "altText": null}}]},
            "variants": {"edges": [{"node": {"id": "gid://shopify/ProductVariant/9"}}]},
            "tags": ["bio"],
            "productType": "",
            "category": null
        })
    }

    #[test]
    fn test_summary_fallbacks() {
        let fields: ProductSummaryFields = serde_json::from_value(summary_json()).unwrap();
        let product = convert_product_summary(fields);

        assert_eq!(product.name, "Savon");
        assert_eq!(product.image, "https://cdn.example/s.jpg");
        assert_eq!(product.image_alt, "Savon");
        assert_eq!(product.category, DEFAULT_CATEGORY);
        assert_eq!(
            product.variant_id.unwrap().as_str(),
            "gid://shopify/ProductVariant/9"
        );
    }

    #[test]
    fn test_summary_without_images_or_variants() {
        let mut json = summary_json();
        json["images"] = serde_json::json!({"edges": []});
        json["variants"] = serde_json::json!({"edges": []});
        json["category"] = serde_json::json!({"name": "Soap"});

        let fields: ProductSummaryFields = serde_json::from_value(json).unwrap();
        let product = convert_product_summary(fields);

        assert!(product.image.is_empty());
        assert_eq!(product.image_alt, "Savon");
        assert!(product.variant_id.is_none());
        assert_eq!(product.category, "Soap");
    }

    #[test]
    fn test_convert_product_detail() {
        let json = serde_json::json!({
            "id": "gid://shopify/Product/1",
            "title": "Savon",
            "handle": "savon",
            "description": "d",
            "descriptionHtml": "<p>d</p>",
            "priceRange": {"minVariantPrice": {"amount": "12.5", "currencyCode": "EUR"}},
            "images": {"edges": [{"node": {"url": "u", "altText": "front"}}]},
            "variants": {"edges": [
                {"node": {"id": "v1", "title": "100 g", "price": {"amount": "12.5", "currencyCode": "EUR"}, "availableForSale": false}},
                {"node": {"id": "v2", "title": "250 g", "price": {"amount": "24.0", "currencyCode": "EUR"}, "availableForSale": true}}
            ]},
            "tags": [],
            "productType": "Bath"
        });
        let fields: get_product_by_handle::ProductFields = serde_json::from_value(json).unwrap();
        let product = convert_product(fields);

        assert_eq!(product.category, "Bath");
        assert_eq!(product.images.first().unwrap().alt, "front");
        assert_eq!(product.first_available_variant().unwrap().id.as_str(), "v2");
    }
}
