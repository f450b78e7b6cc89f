// 文档编译集成测试

use pretty_assertions::assert_eq;
use restdoc::{
    Api, ApiConfig, Doc, ErrorHandler, Namespace, Param, ParamType, Registration, Resource,
    ResponseSpec, RestDocError, SchemaRef, Tag,
};
use serde_json::{Value, json};

fn compile(api: Api) -> Value {
    api.compile().unwrap().to_value().unwrap()
}

#[test]
fn test_push_down_on_shared_path() {
    let item = Resource::new("Item")
        .get(Doc::new().param(Param::new("id").ty(ParamType::Integer)))
        .post(Doc::new().param(Param::new("id").ty(ParamType::String)));
    let items = Namespace::new("items")
        .path("/")
        .add_resource(item, ["/items/<id>"]);
    let swagger = compile(Api::default().namespace(items));
    let path = &swagger["paths"]["/items/{id}"];

    assert!(path.get("parameters").is_none());
    assert_eq!(
        path["get"]["parameters"],
        json!([{"name": "id", "in": "path", "required": true, "type": "integer"}])
    );
    assert_eq!(
        path["post"]["parameters"],
        json!([{"name": "id", "in": "path", "required": true, "type": "string"}])
    );
}

#[test]
fn test_ping_default_response() {
    let ping = Resource::new("Ping").get(Doc::new());
    let ns = Namespace::new("ping")
        .path("/")
        .add_resource(ping, ["/ping"]);
    let swagger = compile(Api::default().namespace(ns));
    assert_eq!(
        swagger["paths"]["/ping"]["get"]["responses"],
        json!({"200": {"description": "Success"}})
    );
}

#[test]
fn test_response_merge_across_levels() {
    let not_found = ResponseSpec::WithSchema(Some("Not found".into()), None);
    let with_schema = ResponseSpec::WithSchema(None, Some(SchemaRef::named("User")));
    let user = Resource::new("User")
        .doc(Doc::new().response(404, not_found))
        .get(Doc::new().response(404, with_schema));
    let ns = Namespace::new("users").add_resource(user, ["/<int:id>"]);
    let swagger = compile(Api::default().namespace(ns));
    assert_eq!(
        swagger["paths"]["/users/{id}"]["get"]["responses"],
        json!({"404": {"description": "Not found", "schema": {"$ref": "#/definitions/User"}}})
    );
}

#[test]
fn test_path_translation_and_shared_params() {
    let post = Resource::new("Post").get(Doc::new());
    let ns = Namespace::new("blog")
        .path("/")
        .add_resource(post, ["/users/<int:id>/posts/<slug>"]);
    let swagger = compile(Api::default().namespace(ns));
    assert_eq!(
        swagger["paths"]["/users/{id}/posts/{slug}"]["parameters"],
        json!([
            {"name": "id", "in": "path", "required": true, "type": "integer"},
            {"name": "slug", "in": "path", "required": true, "type": "string"}
        ])
    );
}

#[test]
fn test_hidden_resource_contributes_nothing() {
    let secret = Resource::new("Secret").hide().get(Doc::new());
    let ns = Namespace::new("secret").add_resource(secret, ["/a", "/b", "/c"]);
    let swagger = compile(Api::default().namespace(ns));
    assert_eq!(swagger["paths"], json!({}));
}

#[test]
fn test_tag_merge_is_unique() {
    let pets = || {
        Namespace::new("pets")
            .description("Pet operations")
            .add_resource(Resource::new("Pet").get(Doc::new()), ["/"])
    };
    let expected = json!([{"name": "pets", "description": "Pet operations"}]);

    let implicit = compile(Api::default().namespace(pets()));
    assert_eq!(implicit["tags"], expected);

    let by_name = compile(Api::default().tag("pets").namespace(pets()));
    assert_eq!(by_name["tags"], expected);

    // 以映射形式声明且不带描述的标签
    let tag = Tag {
        name: "pets".into(),
        description: None,
    };
    let by_mapping = compile(Api::default().tag(tag).namespace(pets()));
    assert_eq!(by_mapping["tags"], expected);

    let config = ApiConfig::from_json(r#"{"tags": [{"name": "pets"}]}"#).unwrap();
    let configured = Api::from_config(config).unwrap().namespace(pets());
    assert_eq!(compile(configured)["tags"], expected);
}

#[test]
fn test_parameters_unique_in_every_operation() {
    let shared = Doc::new()
        .param(Param::header("X-Tenant"))
        .param(Param::new("id").description("identifier"));
    let get = Doc::new()
        .param(Param::new("id").ty(ParamType::Integer))
        .param(Param::header("X-Tenant"));
    let item = Resource::new("Item")
        .doc(shared)
        .get(get)
        .put(Doc::new().param(Param::query("dry_run").ty(ParamType::Boolean)))
        .delete(Doc::new());
    let ns = Namespace::new("items").add_resource(item, ["/<id>"]);
    let swagger = compile(Api::default().namespace(ns));
    let path = &swagger["paths"]["/items/{id}"];
    assert!(path.get("parameters").is_none());
    for verb in ["get", "put", "delete"] {
        let parameters = path[verb]["parameters"].as_array().unwrap();
        let mut keys: Vec<String> = parameters
            .iter()
            .map(|p| format!("{}:{}", p["name"], p["in"]))
            .collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total, "duplicate parameters in {verb}");
    }
    // 下推的参数保留共享声明的描述
    assert_eq!(
        path["delete"]["parameters"][0]["description"],
        json!("identifier")
    );
    assert_eq!(path["get"]["parameters"][0]["type"], json!("integer"));
}

#[test]
fn test_resources_on_same_template_merge() {
    let ns = Namespace::new("items")
        .add_resource_with(
            Resource::new("ItemRead").get(Doc::new()).delete(Doc::new()),
            ["/<int:id>"],
            Registration::methods([http::Method::GET]),
        )
        .add_resource(Resource::new("ItemWrite").put(Doc::new()), ["/<int:id>"]);
    let swagger = compile(Api::default().namespace(ns));
    let path = swagger["paths"]["/items/{id}"].as_object().unwrap();
    let verbs: Vec<_> = path
        .keys()
        .filter(|k| *k != "parameters")
        .cloned()
        .collect();
    assert_eq!(verbs, vec!["get".to_string(), "put".to_string()]);
    assert_eq!(path["get"]["operationId"], json!("get_item_read"));
    assert_eq!(path["put"]["tags"], json!(["items"]));
}

#[test]
fn test_raises_reference_shared_error_response() {
    let get = Doc::new().docstring("Fetch a pet.\n:raises PetNotFound: unknown id");
    let ns = Namespace::new("pets")
        .schema("Error", json!({"type": "object"}))
        .errorhandler(
            ErrorHandler::new("PetNotFound")
                .docstring("Pet not found.")
                .response(404)
                .schema(SchemaRef::named("Error")),
        )
        .add_resource(Resource::new("Pet").get(get), ["/<int:id>"]);
    let swagger = compile(Api::default().namespace(ns));
    assert_eq!(
        swagger["paths"]["/pets/{id}"]["get"]["responses"],
        json!({"404": {"$ref": "#/responses/PetNotFound"}})
    );
    assert_eq!(
        swagger["responses"],
        json!({
            "PetNotFound": {
                "description": "Pet not found",
                "schema": {"$ref": "#/definitions/Error"}
            }
        })
    );
    assert_eq!(swagger["definitions"], json!({"Error": {"type": "object"}}));
}

#[test]
fn test_compile_is_repeatable() {
    let item = Resource::new("Item")
        .get(Doc::new().param(Param::new("id").ty(ParamType::Integer)))
        .post(Doc::new());
    let api = Api::default().namespace(Namespace::new("items").add_resource(item, ["/<id>"]));
    assert_eq!(api.compile().unwrap(), api.compile().unwrap());
}

#[test]
fn test_unsupported_converter_fails_whole_document() {
    let post = Resource::new("Post").get(Doc::new());
    let ns = Namespace::new("posts").add_resource(post, ["/<slug:title>"]);
    let err = Api::default().namespace(ns.clone()).compile().unwrap_err();
    assert!(matches!(err, RestDocError::UnsupportedPathConverter { .. }));

    let api = Api::default().converter("slug").namespace(ns);
    assert!(api.compile().is_ok());
}
