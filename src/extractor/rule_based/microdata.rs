use super::ingredient_line::parse_ingredient_line;
use super::{PageParser, ParseError, ParsingContext};
use crate::extractor::page::element_text;
use crate::model::{ExtractionMethod, ExtractionResult, MealTime};
use log::debug;
use scraper::{ElementRef, Html, Selector};

/// schema.org `Recipe` items marked up with `itemscope`/`itemprop`
pub struct MicroDataParser;

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector(e.to_string()))
}

impl MicroDataParser {
    fn find_recipe_container<'a>(
        &self,
        document: &'a Html,
    ) -> Result<Option<ElementRef<'a>>, ParseError> {
        let scope = selector("[itemscope][itemtype]")?;
        Ok(document.select(&scope).find(|element| {
            element.value().attr("itemtype").is_some_and(|itemtype| {
                itemtype.contains("schema.org/Recipe")
                    || itemtype.contains("data-vocabulary.org/Recipe")
            })
        }))
    }

    /// Value of a property: `content`/`datetime` attributes win over text
    fn property_value(element: ElementRef) -> String {
        let attrs = element.value();
        attrs
            .attr("content")
            .or_else(|| attrs.attr("datetime"))
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| element_text(element))
    }

    fn get_itemprop(&self, root: ElementRef, prop: &str) -> Result<Option<String>, ParseError> {
        let prop_selector = selector(&format!("[itemprop='{prop}']"))?;
        Ok(root
            .select(&prop_selector)
            .next()
            .map(Self::property_value)
            .filter(|value| !value.is_empty()))
    }

    fn get_itemprop_list(&self, root: ElementRef, prop: &str) -> Result<Vec<String>, ParseError> {
        let prop_selector = selector(&format!("[itemprop='{prop}']"))?;
        Ok(root
            .select(&prop_selector)
            .map(Self::property_value)
            .filter(|value| !value.is_empty())
            .collect())
    }

    /// Instructions are either one element per step or a single element
    /// wrapping a list
    fn get_instructions(&self, root: ElementRef) -> Result<Vec<String>, ParseError> {
        let li = selector("li")?;
        for prop in ["recipeInstructions", "instructions"] {
            let prop_selector = selector(&format!("[itemprop='{prop}']"))?;
            let elements: Vec<_> = root.select(&prop_selector).collect();
            if elements.is_empty() {
                continue;
            }

            let mut steps = Vec::new();
            for element in elements {
                let items: Vec<String> = element
                    .select(&li)
                    .map(element_text)
                    .filter(|text| !text.is_empty())
                    .collect();
                if items.is_empty() {
                    let text = element_text(element);
                    if !text.is_empty() {
                        steps.push(text);
                    }
                } else {
                    steps.extend(items);
                }
            }
            return Ok(steps);
        }
        Ok(Vec::new())
    }

    fn get_images(&self, root: ElementRef) -> Result<Vec<String>, ParseError> {
        let image_selector = selector("[itemprop='image']")?;
        Ok(root
            .select(&image_selector)
            .filter_map(|img| {
                let attrs = img.value();
                attrs
                    .attr("src")
                    .or_else(|| attrs.attr("content"))
                    .or_else(|| attrs.attr("href"))
                    .map(str::to_string)
            })
            .collect())
    }
}

impl PageParser for MicroDataParser {
    fn name(&self) -> &'static str {
        "microdata"
    }

    fn confidence(&self) -> f32 {
        0.8
    }

    fn parse(&self, context: &ParsingContext) -> Result<ExtractionResult, ParseError> {
        debug!("Attempting to extract recipe using MicroData parser");

        // Global itemprop searches pick up site titles and author bios, so
        // everything is scoped to the Recipe item.
        let container = self
            .find_recipe_container(&context.document)?
            .ok_or(ParseError::NotFound("no MicroData Recipe container"))?;

        let mut result = ExtractionResult::empty(ExtractionMethod::RuleBased);
        result.title = self.get_itemprop(container, "name")?;
        result.description = self.get_itemprop(container, "description")?;
        result.prep_time = self.get_itemprop(container, "prepTime")?;
        result.cook_time = self.get_itemprop(container, "cookTime")?;
        result.servings = self.get_itemprop(container, "recipeYield")?;

        let mut ingredients = self.get_itemprop_list(container, "recipeIngredient")?;
        if ingredients.is_empty() {
            ingredients = self.get_itemprop_list(container, "ingredients")?;
        }
        result.ingredients = ingredients
            .iter()
            .filter_map(|line| parse_ingredient_line(line))
            .collect();

        result.instructions = self.get_instructions(container)?;
        result.images = self.get_images(container)?;

        for prop in ["recipeCategory", "recipeCuisine", "keywords"] {
            for value in self.get_itemprop_list(container, prop)? {
                for tag in value.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
                    if prop == "recipeCategory" && tag.parse::<MealTime>().is_ok() {
                        result.meal_times.push(tag.to_lowercase());
                    } else {
                        result.tags.push(tag.to_string());
                    }
                }
            }
        }

        Ok(result)
    }
}
