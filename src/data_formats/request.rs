use serde::{Deserialize, Serialize};

// ----------------- Auth Requests -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration payload. Fields are optional so that every missing or
/// invalid field can be reported together by the validation layer.
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

// ----------------- Admin Requests -----------------
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct TagPayload {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub color: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct IngredientPayload {
    pub name: Option<String>,
    pub measurement_unit: Option<String>,
}

// ----------------- Query Parameters -----------------
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct IngredientQuery {
    pub name: Option<String>,
}
