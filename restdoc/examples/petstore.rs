//! 宠物商店示例
//!
//! 声明两个命名空间，编译并打印 Swagger 2.0 文档。
//!
//! 运行方式：
//! ```bash
//! RUST_LOG=restdoc=debug cargo run --example petstore
//! ```

use restdoc::{
    Api, ApiKeyLocation, Doc, ErrorHandler, Expect, Namespace, OAuth2Flow, Param, ParamType,
    Resource, ResponseSpec, SchemaRef, Security, SecurityScheme, ToSchema, endpoint,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// 宠物
#[allow(dead_code)]
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
struct Pet {
    id: u64,
    name: String,
    tag: Option<String>,
}

/// 错误信息
#[allow(dead_code)]
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug)]
struct ApiError {
    code: u16,
    message: String,
}

/// List all pets.
///
/// Results are paginated with `limit` and `offset`.
#[endpoint(id = "list_pets")]
fn list_pets() {}

/// Create a pet.
#[endpoint]
fn create_pet() {}

/// Fetch a single pet.
///
/// :raises PetNotFound: if the id is unknown
#[endpoint]
fn get_pet() {}

/// Remove a pet.
#[endpoint(deprecated)]
fn delete_pet() {}

fn main() -> restdoc::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    list_pets();
    create_pet();
    get_pet();
    delete_pet();

    let limit = Param::query("limit")
        .ty(ParamType::Integer)
        .description("Page size");
    let page = ResponseSpec::schema("Pets", SchemaRef::of::<Pet>().list());
    let list = list_pets_doc()
        .param(limit)
        .param(Param::query("offset").ty(ParamType::Integer))
        .response(200, page);
    let create = create_pet_doc()
        .expect(Expect::body(SchemaRef::of::<Pet>()))
        .response(201, ResponseSpec::schema("Created", SchemaRef::of::<Pet>()))
        .security(Security::scopes("oauth2", ["write:pets"]));
    let get = get_pet_doc().response(200, ResponseSpec::schema("Pet", SchemaRef::of::<Pet>()));
    let pet = Resource::new("Pet")
        .doc(Doc::new().param(Param::new("id").description("Pet identifier")))
        .get(get)
        .delete(delete_pet_doc().response(204, "Deleted"));

    let pets = Namespace::new("pets")
        .description("Pet operations")
        .register_schema::<Pet>()?
        .register_schema::<ApiError>()?
        .authorization(
            "oauth2",
            SecurityScheme::oauth2(OAuth2Flow::Implicit)
                .authorization_url("https://petstore.example.com/oauth/authorize")
                .scope("read:pets", "Read pets")
                .scope("write:pets", "Modify pets"),
        )
        .errorhandler(
            ErrorHandler::new("PetNotFound")
                .docstring("The pet does not exist.")
                .response(404)
                .schema(SchemaRef::of::<ApiError>()),
        )
        .add_resource(Resource::new("PetList").get(list).post(create), ["/"])
        .add_resource(pet, ["/<int:id>"]);

    let counts = Doc::new().docstring("Inventory counts by status.");
    let inventory = Resource::new("Inventory").get(counts);
    let store = Namespace::new("store").add_resource(inventory, ["/inventory"]);

    let api = Api::new("Pet Store", "1.0.0")
        .description("A sample pet store")
        .base_path("/api/")
        .authorization(
            "apikey",
            SecurityScheme::api_key("X-API-KEY", ApiKeyLocation::Header),
        )
        .security("apikey")
        .namespace(pets)
        .namespace(store);

    println!("{}", api.compile()?.to_pretty_json()?);
    Ok(())
}
