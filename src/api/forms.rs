use std::collections::HashSet;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;

use crate::{
    constants::{DEFAULT_TAG_COLOR, MIN_COOKING_TIME, MIN_INGREDIENT_AMOUNT},
    database::schema::Uuid,
    error::ApiError,
};

fn invalid(info: &str) -> ApiError {
    ApiError::Validation(info.to_string())
}

#[derive(Deserialize, Debug)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.email.is_empty() || !self.email.contains('@') {
            return Err(invalid("Invalid email address"));
        }
        if self.username.is_empty() {
            return Err(invalid("Username cannot be empty"));
        }
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return Err(invalid("First and last name cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(invalid("Password cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct SetPasswordForm {
    pub current_password: String,
    pub new_password: String,
}

impl SetPasswordForm {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.new_password.is_empty() {
            return Err(invalid("Password cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Deserialize, Debug)]
pub struct RecipeForm {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipeForm {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() {
            return Err(invalid("Recipe name cannot be empty"));
        }
        if self.cooking_time < MIN_COOKING_TIME {
            return Err(invalid(
                "Cooking time cannot be empty or less than 2 minutes",
            ));
        }
        if self.tags.is_empty() {
            return Err(invalid("You must select a tag or tags"));
        }
        let mut seen_tags: HashSet<Uuid> = HashSet::new();
        for tag_id in &self.tags {
            if !seen_tags.insert(*tag_id) {
                return Err(ApiError::Validation(format!(
                    "Tag {tag_id} is already in the recipe"
                )));
            }
        }
        if self.ingredients.is_empty() {
            return Err(invalid("The list of ingredients cannot be empty"));
        }

        let mut seen: HashSet<Uuid> = HashSet::new();
        for ingredient in &self.ingredients {
            if ingredient.amount < MIN_INGREDIENT_AMOUNT {
                return Err(invalid(
                    "Ingredient amount cannot be empty or less than 1",
                ));
            }
            if !seen.insert(ingredient.id) {
                return Err(ApiError::Validation(format!(
                    "Ingredient {} is already in the recipe",
                    ingredient.id
                )));
            }
        }

        decode_base64_image(&self.image)?;

        Ok(())
    }

    pub fn ingredient_pairs(&self) -> Vec<(Uuid, i32)> {
        self.ingredients.iter().map(|i| (i.id, i.amount)).collect()
    }
}

/// Checks that the submitted image is valid base64, with or without a
/// `data:<mime>;base64,` prefix. The payload itself is stored verbatim.
pub fn decode_base64_image(value: &str) -> Result<(), ApiError> {
    let encoded = match value.split_once(";base64,") {
        Some((header, encoded)) if header.starts_with("data:") => encoded,
        Some(_) => return Err(invalid("Invalid image payload")),
        None => value,
    };

    if encoded.is_empty() {
        return Err(invalid("Image cannot be empty"));
    }

    STANDARD
        .decode(encoded)
        .map(|_| ())
        .map_err(|_| invalid("Invalid image payload"))
}

#[derive(Deserialize, Debug)]
pub struct TagForm {
    pub name: String,
    pub color: Option<String>,
    pub slug: String,
}

impl TagForm {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() {
            return Err(invalid("Tag name cannot be empty"));
        }
        if self.slug.is_empty()
            || !self
                .slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid("Invalid slug"));
        }
        let color = self.color();
        let hex = color.strip_prefix('#').unwrap_or("");
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("Color must be a hex code like #FF0000"));
        }
        Ok(())
    }

    pub fn color(&self) -> String {
        self.color
            .clone()
            .unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string())
    }
}

#[derive(Deserialize, Debug)]
pub struct IngredientForm {
    pub name: String,
    pub measurement_unit: String,
}

impl IngredientForm {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() || self.measurement_unit.is_empty() {
            return Err(invalid("Name and measurement unit cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub recipes_limit: Option<i64>,
}

impl PageQuery {
    /// Effective (offset, limit) pair: offsets are non-negative, the page
    /// size defaults to `default` and never exceeds `cap`.
    pub fn bounds(&self, default: i64, cap: i64) -> (i64, i64) {
        let offset = self.offset.unwrap_or(0).max(0);
        let limit = self.limit.unwrap_or(default).clamp(1, cap);
        (offset, limit)
    }

    /// Nested-recipe truncation for subscription views, clamped non-negative
    /// since Postgres rejects a negative `LIMIT`.
    pub fn recipes_limit(&self) -> Option<i64> {
        self.recipes_limit.map(|limit| limit.max(0))
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

/// Recipe-listing query. Decoded as key-value pairs because `tags` repeats
/// (`?tags=lunch&tags=dinner`), which `warp::query`'s struct target cannot
/// express.
#[derive(Debug, Default, PartialEq)]
pub struct RecipeListQuery {
    pub author: Option<Uuid>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub offset: i64,
    pub limit: Option<i64>,
}

pub fn parse_recipe_query(raw: &str) -> RecipeListQuery {
    let mut query = RecipeListQuery::default();
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).unwrap_or_default();

    for (key, value) in pairs {
        match key.as_str() {
            "author" => query.author = value.parse().ok(),
            "tags" => {
                if !value.is_empty() {
                    query.tags.push(value);
                }
            }
            "is_favorited" => query.is_favorited = truthy(&value),
            "is_in_shopping_cart" => query.is_in_shopping_cart = truthy(&value),
            "offset" => query.offset = value.parse().unwrap_or(0).max(0),
            "limit" => query.limit = value.parse().ok(),
            _ => {}
        }
    }

    query
}

fn truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_form() -> RecipeForm {
        RecipeForm {
            name: String::from("Omelette"),
            text: String::from("Whisk and fry."),
            image: STANDARD.encode([0xFF, 0xD8, 0xFF]),
            cooking_time: 10,
            tags: vec![1],
            ingredients: vec![
                IngredientAmount { id: 1, amount: 2 },
                IngredientAmount { id: 2, amount: 1 },
            ],
        }
    }

    #[test]
    fn valid_recipe_form_passes() {
        assert!(recipe_form().validate().is_ok());
    }

    #[test]
    fn duplicate_ingredient_is_rejected() {
        let mut form = recipe_form();
        form.ingredients.push(IngredientAmount { id: 1, amount: 3 });
        assert!(form.validate().is_err());
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let mut form = recipe_form();
        form.tags = vec![1, 1];
        assert!(form.validate().is_err());

        form.tags = vec![1, 2];
        assert!(form.validate().is_ok());
    }

    #[test]
    fn empty_tag_list_is_rejected() {
        let mut form = recipe_form();
        form.tags.clear();
        assert!(form.validate().is_err());
    }

    #[test]
    fn empty_ingredient_list_is_rejected() {
        let mut form = recipe_form();
        form.ingredients.clear();
        assert!(form.validate().is_err());
    }

    #[test]
    fn short_cooking_time_is_rejected() {
        let mut form = recipe_form();
        form.cooking_time = 1;
        assert!(form.validate().is_err());
        form.cooking_time = 2;
        assert!(form.validate().is_ok());
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let mut form = recipe_form();
        form.ingredients[0].amount = 0;
        assert!(form.validate().is_err());
    }

    #[test]
    fn data_uri_images_are_accepted() {
        assert!(decode_base64_image(&format!(
            "data:image/png;base64,{}",
            STANDARD.encode([1, 2, 3])
        ))
        .is_ok());
        assert!(decode_base64_image("not base64!!!").is_err());
        assert!(decode_base64_image("").is_err());
    }

    #[test]
    fn tag_color_defaults_and_validates() {
        let form = TagForm {
            name: String::from("breakfast"),
            color: None,
            slug: String::from("breakfast"),
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.color(), DEFAULT_TAG_COLOR);

        let bad = TagForm {
            color: Some(String::from("red")),
            ..form
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn recipe_query_collects_repeated_tags() {
        let query = parse_recipe_query("tags=lunch&tags=dinner&author=3&is_favorited=1");
        assert_eq!(query.tags, vec!["lunch", "dinner"]);
        assert_eq!(query.author, Some(3));
        assert!(query.is_favorited);
        assert!(!query.is_in_shopping_cart);
    }

    #[test]
    fn recipe_query_decodes_components() {
        let query = parse_recipe_query("tags=s%C3%BCnd");
        assert_eq!(query.tags, vec!["sünd"]);

        let query = parse_recipe_query("tags=iced+tea");
        assert_eq!(query.tags, vec!["iced tea"]);

        let query = parse_recipe_query("offset=12&limit=3");
        assert_eq!(query.offset, 12);
        assert_eq!(query.limit, Some(3));
    }

    #[test]
    fn page_query_bounds_are_clamped() {
        let query = PageQuery {
            offset: Some(-5),
            limit: Some(10_000),
            recipes_limit: None,
        };
        assert_eq!(query.bounds(6, 100), (0, 100));
        assert_eq!(PageQuery::default().bounds(6, 100), (0, 6));
    }

    #[test]
    fn negative_recipes_limit_is_clamped() {
        let query = PageQuery {
            offset: None,
            limit: None,
            recipes_limit: Some(-3),
        };
        assert_eq!(query.recipes_limit(), Some(0));
        assert_eq!(PageQuery::default().recipes_limit(), None);
    }
}
