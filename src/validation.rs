//! Pure validators turning raw payloads into typed command objects.
//!
//! Every rule that can be checked without the database lives here, and
//! all failures of one submission are collected into a single per-field
//! 400 response. Existence checks against tags/ingredients happen in
//! the database layer.

use serde_json::Value;

use crate::color;
use crate::data_formats::{IngredientPayload, RegisterRequest, TagPayload};
use crate::errors::{FieldError, RequestError};
use crate::images::{parse_data_uri, ImageData};

const MAX_NAME_LEN: usize = 200;
const MAX_USERNAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug)]
pub struct RegisterCommand {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i64,
}

/// Validated recipe submission. For PATCH, absent fields stay `None`
/// and keep their stored values.
#[derive(Debug, Default)]
pub struct RecipeCommand {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    pub image: Option<ImageData>,
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

#[derive(Debug)]
pub struct TagCommand {
    pub name: String,
    pub slug: String,
    pub color: String,
}

#[derive(Debug)]
pub struct IngredientCommand {
    pub name: String,
    pub measurement_unit: String,
}

pub fn valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '+' | '-'))
}

pub fn validate_register(request: &RegisterRequest) -> Result<RegisterCommand, RequestError> {
    let mut errors = Vec::new();

    let email = match request.email.as_deref() {
        Some(email) if !email.is_empty() && email.contains('@') && email.len() <= MAX_EMAIL_LEN => {
            Some(email.to_string())
        }
        Some(_) => {
            errors.push(FieldError::new("email", "enter a valid email address"));
            None
        }
        None => {
            errors.push(FieldError::new("email", "this field is required"));
            None
        }
    };
    let username = match request.username.as_deref() {
        Some(username) if valid_username(username) && username.len() <= MAX_USERNAME_LEN => {
            Some(username.to_string())
        }
        Some(_) => {
            errors.push(FieldError::new(
                "username",
                "username may contain only letters, digits and . _ @ + -",
            ));
            None
        }
        None => {
            errors.push(FieldError::new("username", "this field is required"));
            None
        }
    };
    let first_name = required_name(&mut errors, "first_name", request.first_name.as_deref());
    let last_name = required_name(&mut errors, "last_name", request.last_name.as_deref());
    let password = match request.password.as_deref() {
        Some(password) if password.len() >= MIN_PASSWORD_LEN => Some(password.to_string()),
        Some(_) => {
            errors.push(FieldError::new(
                "password",
                format!("password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
            None
        }
        None => {
            errors.push(FieldError::new("password", "this field is required"));
            None
        }
    };

    if !errors.is_empty() {
        return Err(RequestError::Validation(errors));
    }
    // All unwraps guarded by the emptiness check above.
    Ok(RegisterCommand {
        email: email.unwrap(),
        username: username.unwrap(),
        first_name: first_name.unwrap(),
        last_name: last_name.unwrap(),
        password: password.unwrap(),
    })
}

fn required_name(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<&str>,
) -> Option<String> {
    match value {
        Some(value) if !value.is_empty() && value.len() <= MAX_USERNAME_LEN => {
            Some(value.to_string())
        }
        Some(_) => {
            errors.push(FieldError::new(field, "enter a non-empty name"));
            None
        }
        None => {
            errors.push(FieldError::new(field, "this field is required"));
            None
        }
    }
}

/// Validates a recipe submission. With `require_all` every field must
/// be present (POST/PUT); without it only provided fields are checked
/// (PATCH), but a provided empty edge list is still rejected.
pub fn validate_recipe_payload(
    payload: &Value,
    require_all: bool,
) -> Result<RecipeCommand, RequestError> {
    let Some(object) = payload.as_object() else {
        return Err(RequestError::BadRequest("expected a JSON object"));
    };
    let mut errors = Vec::new();
    let mut command = RecipeCommand::default();

    match object.get("name") {
        Some(Value::String(name)) if !name.is_empty() && name.len() <= MAX_NAME_LEN => {
            command.name = Some(name.clone());
        }
        Some(_) => errors.push(FieldError::new("name", "enter a non-empty recipe name")),
        None if require_all => errors.push(FieldError::new("name", "this field is required")),
        None => {}
    }

    match object.get("text") {
        Some(Value::String(text)) if !text.is_empty() => command.text = Some(text.clone()),
        Some(_) => errors.push(FieldError::new("text", "enter a non-empty description")),
        None if require_all => errors.push(FieldError::new("text", "this field is required")),
        None => {}
    }

    match object.get("cooking_time") {
        Some(value) => match value.as_i64() {
            Some(minutes) if minutes >= 1 => command.cooking_time = Some(minutes),
            _ => errors.push(FieldError::new("cooking_time", "cooking time ≥ 1")),
        },
        None if require_all => {
            errors.push(FieldError::new("cooking_time", "this field is required"))
        }
        None => {}
    }

    match object.get("image") {
        Some(Value::String(image)) if !image.is_empty() => match parse_data_uri(image) {
            Ok(image) => command.image = Some(image),
            Err(message) => errors.push(FieldError::new("image", message)),
        },
        Some(_) => errors.push(FieldError::new("image", "image must not be empty")),
        None if require_all => errors.push(FieldError::new("image", "this field is required")),
        None => {}
    }

    match object.get("tags") {
        Some(Value::Array(tags)) => {
            if tags.is_empty() {
                errors.push(FieldError::new("tags", "specify at least one tag"));
            } else {
                let mut ids = Vec::with_capacity(tags.len());
                for tag in tags {
                    match tag.as_i64() {
                        Some(id) if !ids.contains(&id) => ids.push(id),
                        Some(_) => {
                            errors.push(FieldError::new("tags", "duplicate tag in the list"))
                        }
                        None => errors.push(FieldError::new("tags", "tag ids must be integers")),
                    }
                }
                command.tags = Some(ids);
            }
        }
        Some(_) => errors.push(FieldError::new("tags", "tags must be a list of ids")),
        None if require_all => errors.push(FieldError::new("tags", "this field is required")),
        None => {}
    }

    match object.get("ingredients") {
        Some(Value::Array(ingredients)) => {
            if ingredients.is_empty() {
                errors.push(FieldError::new(
                    "ingredients",
                    "specify at least one ingredient",
                ));
            } else {
                let mut entries: Vec<IngredientAmount> = Vec::with_capacity(ingredients.len());
                for entry in ingredients {
                    let id = entry.get("id").and_then(Value::as_i64);
                    let amount = entry.get("amount").and_then(Value::as_i64);
                    match (id, amount) {
                        (Some(id), _) if entries.iter().any(|e| e.id == id) => errors.push(
                            FieldError::new("ingredients", "duplicate ingredient in the list"),
                        ),
                        (Some(_), Some(amount)) if amount < 1 => {
                            errors.push(FieldError::new("ingredients", "amount ≥ 1"))
                        }
                        (Some(_), None) => {
                            errors.push(FieldError::new("ingredients", "amount ≥ 1"))
                        }
                        (None, _) => errors.push(FieldError::new(
                            "ingredients",
                            "ingredient ids must be integers",
                        )),
                        (Some(id), Some(amount)) => entries.push(IngredientAmount { id, amount }),
                    }
                }
                command.ingredients = Some(entries);
            }
        }
        Some(_) => errors.push(FieldError::new(
            "ingredients",
            "ingredients must be a list of {id, amount}",
        )),
        None if require_all => errors.push(FieldError::new("ingredients", "this field is required")),
        None => {}
    }

    if errors.is_empty() {
        Ok(command)
    } else {
        Err(RequestError::Validation(errors))
    }
}

pub fn validate_tag_payload(payload: &TagPayload) -> Result<TagCommand, RequestError> {
    let mut errors = Vec::new();

    let name = match payload.name.as_deref() {
        Some(name) if !name.is_empty() && name.len() <= MAX_NAME_LEN => Some(name.to_string()),
        Some(_) => {
            errors.push(FieldError::new("name", "enter a non-empty tag name"));
            None
        }
        None => {
            errors.push(FieldError::new("name", "this field is required"));
            None
        }
    };
    let slug = match payload.slug.as_deref() {
        Some(slug)
            if !slug.is_empty()
                && slug.len() <= MAX_NAME_LEN
                && slug
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_')) =>
        {
            Some(slug.to_string())
        }
        Some(_) => {
            errors.push(FieldError::new(
                "slug",
                "slug may contain only letters, digits, - and _",
            ));
            None
        }
        None => {
            errors.push(FieldError::new("slug", "this field is required"));
            None
        }
    };
    let color = match payload.color.as_deref() {
        Some(value) if color::is_hex_color(value) => {
            if color::name_for_hex(value).is_some() {
                Some(value.to_string())
            } else {
                errors.push(FieldError::new("color", "no name for this color"));
                None
            }
        }
        Some(_) => {
            errors.push(FieldError::new("color", "color must look like #RRGGBB"));
            None
        }
        None => {
            errors.push(FieldError::new("color", "this field is required"));
            None
        }
    };

    if !errors.is_empty() {
        return Err(RequestError::Validation(errors));
    }
    Ok(TagCommand {
        name: name.unwrap(),
        slug: slug.unwrap(),
        color: color.unwrap(),
    })
}

pub fn validate_ingredient_payload(
    payload: &IngredientPayload,
) -> Result<IngredientCommand, RequestError> {
    let mut errors = Vec::new();
    let name = match payload.name.as_deref() {
        Some(name) if !name.is_empty() && name.len() <= MAX_NAME_LEN => Some(name.to_string()),
        _ => {
            errors.push(FieldError::new("name", "enter a non-empty ingredient name"));
            None
        }
    };
    let measurement_unit = match payload.measurement_unit.as_deref() {
        Some(unit) if !unit.is_empty() && unit.len() <= MAX_NAME_LEN => Some(unit.to_string()),
        _ => {
            errors.push(FieldError::new(
                "measurement_unit",
                "enter a non-empty measurement unit",
            ));
            None
        }
    };
    if !errors.is_empty() {
        return Err(RequestError::Validation(errors));
    }
    Ok(IngredientCommand {
        name: name.unwrap(),
        measurement_unit: measurement_unit.unwrap(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(result: Result<RecipeCommand, RequestError>) -> Vec<&'static str> {
        match result {
            Err(RequestError::Validation(errors)) => errors.iter().map(|e| e.field).collect(),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    fn full_payload() -> Value {
        json!({
            "name": "Омлет",
            "text": "Взбить и пожарить",
            "cooking_time": 10,
            "image": "data:image/png;base64,aGVsbG8=",
            "tags": [1],
            "ingredients": [{"id": 5, "amount": 2}],
        })
    }

    #[test]
    fn accepts_full_payload() {
        let command = validate_recipe_payload(&full_payload(), true).unwrap();
        assert_eq!(command.name.as_deref(), Some("Омлет"));
        assert_eq!(command.cooking_time, Some(10));
        assert_eq!(command.tags, Some(vec![1]));
        assert_eq!(
            command.ingredients,
            Some(vec![IngredientAmount { id: 5, amount: 2 }])
        );
        assert_eq!(command.image.unwrap().ext, "png");
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let reported = fields(validate_recipe_payload(&json!({}), true));
        assert_eq!(
            reported,
            ["name", "text", "cooking_time", "image", "tags", "ingredients"]
        );
    }

    #[test]
    fn rejects_zero_cooking_time() {
        let mut payload = full_payload();
        payload["cooking_time"] = json!(0);
        assert_eq!(fields(validate_recipe_payload(&payload, true)), ["cooking_time"]);
        payload["cooking_time"] = json!(-3);
        assert_eq!(fields(validate_recipe_payload(&payload, true)), ["cooking_time"]);
    }

    #[test]
    fn rejects_empty_and_duplicate_edges() {
        let mut payload = full_payload();
        payload["tags"] = json!([]);
        payload["ingredients"] = json!([]);
        assert_eq!(
            fields(validate_recipe_payload(&payload, true)),
            ["tags", "ingredients"]
        );

        let mut payload = full_payload();
        payload["tags"] = json!([1, 1]);
        assert_eq!(fields(validate_recipe_payload(&payload, true)), ["tags"]);

        let mut payload = full_payload();
        payload["ingredients"] = json!([{"id": 5, "amount": 2}, {"id": 5, "amount": 1}]);
        assert_eq!(fields(validate_recipe_payload(&payload, true)), ["ingredients"]);
    }

    #[test]
    fn rejects_zero_amount() {
        let mut payload = full_payload();
        payload["ingredients"] = json!([{"id": 5, "amount": 0}]);
        assert_eq!(fields(validate_recipe_payload(&payload, true)), ["ingredients"]);
    }

    #[test]
    fn patch_keeps_absent_fields() {
        let command =
            validate_recipe_payload(&json!({"name": "Новое имя"}), false).unwrap();
        assert_eq!(command.name.as_deref(), Some("Новое имя"));
        assert!(command.tags.is_none());
        assert!(command.ingredients.is_none());
        assert!(command.image.is_none());
    }

    #[test]
    fn patch_rejects_provided_empty_lists() {
        let payload = json!({"tags": [], "ingredients": []});
        assert_eq!(
            fields(validate_recipe_payload(&payload, false)),
            ["tags", "ingredients"]
        );
    }

    #[test]
    fn register_collects_all_failures() {
        let request = RegisterRequest {
            email: Some("not-an-email".to_string()),
            username: Some("bad name!".to_string()),
            first_name: None,
            last_name: Some("A".to_string()),
            password: Some("short".to_string()),
        };
        match validate_register(&request) {
            Err(RequestError::Validation(errors)) => {
                let reported: Vec<&str> = errors.iter().map(|e| e.field).collect();
                assert_eq!(reported, ["email", "username", "first_name", "password"]);
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn register_accepts_valid_payload() {
        let request = RegisterRequest {
            email: Some("a@x.io".to_string()),
            username: Some("alice".to_string()),
            first_name: Some("A".to_string()),
            last_name: Some("A".to_string()),
            password: Some("pw12345!".to_string()),
        };
        let command = validate_register(&request).unwrap();
        assert_eq!(command.username, "alice");
    }

    #[test]
    fn username_charset() {
        assert!(valid_username("alice.bob_1@x+y-z"));
        assert!(!valid_username(""));
        assert!(!valid_username("алиса"));
        assert!(!valid_username("with space"));
    }

    #[test]
    fn tag_color_must_have_a_css_name() {
        let payload = TagPayload {
            name: Some("Завтрак".to_string()),
            slug: Some("breakfast".to_string()),
            color: Some("#000000".to_string()),
        };
        match validate_tag_payload(&payload) {
            Err(RequestError::Validation(errors)) => {
                assert_eq!(errors[0].field, "color");
                assert_eq!(errors[0].message, "no name for this color");
            }
            other => panic!("expected a validation error, got {other:?}"),
        }

        let payload = TagPayload {
            name: Some("Завтрак".to_string()),
            slug: Some("breakfast".to_string()),
            color: Some("#E6E6FA".to_string()),
        };
        assert!(validate_tag_payload(&payload).is_ok());
    }
}
