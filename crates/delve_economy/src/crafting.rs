//! # Crafting System - Directed Acyclic Graph (DAG)
//!
//! **Transactional Recipe System with Cycle Detection**
//!
//! 1. **No Cycles**: The recipe graph is validated to be acyclic (DAG)
//! 2. **Transactional**: Crafting is atomic - all materials consumed OR nothing happens
//! 3. **Receipts**: Every successful craft reports what it produced, so the
//!    stage director can react to trigger items
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut graph = CraftingGraph::new();
//! graph.add_recipe(Recipe::iron_sword())?;
//! assert!(graph.validate_no_cycles());
//!
//! let receipt = graph.craft(&mut inventory, IRON_SWORD_RECIPE)?;
//! assert!(receipt.produced(MaterialKind::IronSword));
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};

use delve_procedural::MaterialKind;
use serde::{Deserialize, Serialize};

use crate::error::{EconomyError, EconomyResult};
use crate::inventory::Inventory;

/// Unique identifier for a recipe.
pub type RecipeId = u32;

/// Built-in recipe: 2 iron into an iron sword.
pub const IRON_SWORD_RECIPE: RecipeId = 1;
/// Built-in recipe: iron sword plus diamonds into a diamond sword.
pub const DIAMOND_SWORD_RECIPE: RecipeId = 2;
/// Built-in recipe: obsidian and gold into the frost charm.
pub const FROST_CHARM_RECIPE: RecipeId = 3;

/// Input or output item in a recipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeItem {
    /// The item kind.
    pub item: MaterialKind,
    /// Quantity required/produced.
    pub quantity: u32,
}

impl RecipeItem {
    /// Creates a new recipe item.
    #[inline]
    #[must_use]
    pub const fn new(item: MaterialKind, quantity: u32) -> Self {
        Self { item, quantity }
    }
}

/// A crafting recipe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique recipe identifier.
    pub id: RecipeId,
    /// Human-readable name.
    pub name: String,
    /// Items consumed by this recipe.
    pub inputs: Vec<RecipeItem>,
    /// Items produced by this recipe.
    pub outputs: Vec<RecipeItem>,
}

impl Recipe {
    /// Creates a new recipe with basic validation.
    ///
    /// # Errors
    ///
    /// Returns error if recipe has no inputs or outputs, or a zero quantity.
    pub fn new(
        id: RecipeId,
        name: impl Into<String>,
        inputs: Vec<RecipeItem>,
        outputs: Vec<RecipeItem>,
    ) -> EconomyResult<Self> {
        let recipe = Self {
            id,
            name: name.into(),
            inputs,
            outputs,
        };
        recipe.validate()?;
        Ok(recipe)
    }

    /// Checks the shape of a recipe loaded from config.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InvalidConfig` describing the first problem.
    pub fn validate(&self) -> EconomyResult<()> {
        if self.inputs.is_empty() {
            return Err(EconomyError::InvalidConfig(format!(
                "recipe '{}' must have at least one input",
                self.name
            )));
        }
        if self.outputs.is_empty() {
            return Err(EconomyError::InvalidConfig(format!(
                "recipe '{}' must have at least one output",
                self.name
            )));
        }
        if self
            .inputs
            .iter()
            .chain(&self.outputs)
            .any(|item| item.quantity == 0)
        {
            return Err(EconomyError::InvalidConfig(format!(
                "recipe '{}' has a zero quantity",
                self.name
            )));
        }
        Ok(())
    }

    /// 2 iron → 1 iron sword.
    #[must_use]
    pub fn iron_sword() -> Self {
        Self {
            id: IRON_SWORD_RECIPE,
            name: "iron_sword".to_string(),
            inputs: vec![RecipeItem::new(MaterialKind::Iron, 2)],
            outputs: vec![RecipeItem::new(MaterialKind::IronSword, 1)],
        }
    }

    /// 1 iron sword + 2 diamond → 1 diamond sword.
    #[must_use]
    pub fn diamond_sword() -> Self {
        Self {
            id: DIAMOND_SWORD_RECIPE,
            name: "diamond_sword".to_string(),
            inputs: vec![
                RecipeItem::new(MaterialKind::IronSword, 1),
                RecipeItem::new(MaterialKind::Diamond, 2),
            ],
            outputs: vec![RecipeItem::new(MaterialKind::DiamondSword, 1)],
        }
    }

    /// 2 obsidian + 1 gold → 1 frost charm.
    #[must_use]
    pub fn frost_charm() -> Self {
        Self {
            id: FROST_CHARM_RECIPE,
            name: "frost_charm".to_string(),
            inputs: vec![
                RecipeItem::new(MaterialKind::Obsidian, 2),
                RecipeItem::new(MaterialKind::Gold, 1),
            ],
            outputs: vec![RecipeItem::new(MaterialKind::FrostCharm, 1)],
        }
    }
}

/// Record of a completed craft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CraftReceipt {
    /// Recipe that ran.
    pub recipe: RecipeId,
    /// What was added to the inventory.
    pub outputs: Vec<RecipeItem>,
}

impl CraftReceipt {
    /// Returns true if this craft produced `kind`.
    #[must_use]
    pub fn produced(&self, kind: MaterialKind) -> bool {
        self.outputs.iter().any(|o| o.item == kind)
    }
}

/// The crafting graph - a Directed Acyclic Graph of recipes.
#[derive(Debug, Default)]
pub struct CraftingGraph {
    /// All recipes indexed by ID (ordered for deterministic iteration).
    recipes: BTreeMap<RecipeId, Recipe>,
    /// Items that can be produced, mapped to recipes that produce them.
    item_producers: HashMap<MaterialKind, Vec<RecipeId>>,
    /// Whether the graph has been validated as cycle-free.
    validated: bool,
}

impl CraftingGraph {
    /// Creates a new empty crafting graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in recipe set.
    #[must_use]
    pub fn standard() -> Self {
        let mut graph = Self::new();
        for recipe in [Recipe::iron_sword(), Recipe::diamond_sword(), Recipe::frost_charm()] {
            graph.insert_unchecked(recipe);
        }
        graph
    }

    /// Builds a validated graph from config recipes.
    ///
    /// # Errors
    ///
    /// Fails on malformed recipes, duplicate ids or cycles.
    pub fn from_recipes(recipes: Vec<Recipe>) -> EconomyResult<Self> {
        let mut graph = Self::new();
        for recipe in recipes {
            graph.add_recipe(recipe)?;
        }
        if !graph.validate_no_cycles() {
            let at = graph.recipes.keys().next().copied().unwrap_or_default();
            return Err(EconomyError::CycleDetected(at));
        }
        Ok(graph)
    }

    /// Adds a recipe to the graph.
    ///
    /// # Errors
    ///
    /// Returns error if the recipe is malformed or its ID already exists.
    pub fn add_recipe(&mut self, recipe: Recipe) -> EconomyResult<()> {
        recipe.validate()?;
        if self.recipes.contains_key(&recipe.id) {
            return Err(EconomyError::InvalidConfig(format!(
                "recipe ID {} already exists",
                recipe.id
            )));
        }
        self.insert_unchecked(recipe);
        Ok(())
    }

    fn insert_unchecked(&mut self, recipe: Recipe) {
        for output in &recipe.outputs {
            self.item_producers
                .entry(output.item)
                .or_default()
                .push(recipe.id);
        }
        self.recipes.insert(recipe.id, recipe);
        self.validated = false;
    }

    /// Gets a recipe by ID.
    #[must_use]
    pub fn get_recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(&id)
    }

    /// Finds the first recipe (by id) producing `kind`.
    #[must_use]
    pub fn recipe_for(&self, kind: MaterialKind) -> Option<&Recipe> {
        self.item_producers
            .get(&kind)
            .and_then(|ids| ids.iter().min())
            .and_then(|id| self.recipes.get(id))
    }

    /// All recipes, by id.
    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> + '_ {
        self.recipes.values()
    }

    /// Returns the number of recipes.
    #[must_use]
    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// Validates that the recipe graph has no cycles.
    ///
    /// Uses Kahn's algorithm for topological sorting.
    #[must_use]
    pub fn validate_no_cycles(&mut self) -> bool {
        if self.validated {
            return true;
        }

        // Edge A -> B when A produces something B consumes
        let mut in_degree: HashMap<RecipeId, usize> =
            self.recipes.keys().map(|&id| (id, 0)).collect();
        let mut adjacency: HashMap<RecipeId, Vec<RecipeId>> = HashMap::new();

        for (&recipe_id, recipe) in &self.recipes {
            for input in &recipe.inputs {
                if let Some(producers) = self.item_producers.get(&input.item) {
                    for &producer_id in producers {
                        adjacency.entry(producer_id).or_default().push(recipe_id);
                        *in_degree.entry(recipe_id).or_insert(0) += 1;
                    }
                }
            }
        }

        let mut queue: VecDeque<RecipeId> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut sorted_count = 0;

        while let Some(recipe_id) = queue.pop_front() {
            sorted_count += 1;
            if let Some(neighbors) = adjacency.get(&recipe_id) {
                for &neighbor in neighbors {
                    if let Some(deg) = in_degree.get_mut(&neighbor) {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push_back(neighbor);
                        }
                    }
                }
            }
        }

        self.validated = sorted_count == self.recipes.len();
        self.validated
    }

    /// Checks whether the inventory holds every input.
    ///
    /// # Errors
    ///
    /// `RecipeNotFound` or `InsufficientMaterials` naming the first shortfall.
    pub fn can_craft(&self, inventory: &Inventory, recipe_id: RecipeId) -> EconomyResult<()> {
        let recipe = self
            .recipes
            .get(&recipe_id)
            .ok_or(EconomyError::RecipeNotFound(recipe_id))?;

        for input in &recipe.inputs {
            let available = inventory.count(input.item);
            if available < input.quantity {
                return Err(EconomyError::InsufficientMaterials {
                    item: input.item,
                    required: input.quantity,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Performs a transactional craft operation.
    ///
    /// **ATOMIC**: Either all inputs are consumed and all outputs created,
    /// or the inventory is restored from a snapshot.
    ///
    /// # Errors
    ///
    /// Propagates the first failure after rolling back.
    pub fn craft(&self, inventory: &mut Inventory, recipe_id: RecipeId) -> EconomyResult<CraftReceipt> {
        self.can_craft(inventory, recipe_id)?;
        let recipe = self
            .recipes
            .get(&recipe_id)
            .ok_or(EconomyError::RecipeNotFound(recipe_id))?;

        let snapshot = inventory.snapshot();
        let result = Self::apply(inventory, recipe);
        if let Err(err) = result {
            inventory.restore(&snapshot);
            tracing::warn!(recipe = %recipe.name, %err, "craft rolled back");
            return Err(err);
        }

        tracing::info!(recipe = %recipe.name, "craft completed");
        Ok(CraftReceipt {
            recipe: recipe_id,
            outputs: recipe.outputs.clone(),
        })
    }

    fn apply(inventory: &mut Inventory, recipe: &Recipe) -> EconomyResult<()> {
        for input in &recipe.inputs {
            inventory.remove(input.item, input.quantity)?;
        }
        for output in &recipe.outputs {
            inventory.add(output.item, output.quantity)?;
        }
        Ok(())
    }
}
