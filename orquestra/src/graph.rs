//! Container dependency graph.
//!
//! Built from the `depends_on` declarations of every registered
//! [`ContainerProvider`], flattened and deduplicated by token. The graph
//! keeps insertion order so start/stop logs stay stable across runs.

use std::collections::HashMap;

use indexmap::IndexMap;

use orquestra_core::container::ContainerProvider;
use orquestra_core::error::LifecycleError;
use orquestra_core::registry::Token;

/// Directed graph: container token -> tokens it depends on.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: IndexMap<Token, Vec<Token>>,
    providers: IndexMap<Token, ContainerProvider>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from top-level container providers, walking
    /// `depends_on` recursively.
    pub fn from_providers<'a>(roots: impl IntoIterator<Item = &'a ContainerProvider>) -> Self {
        let mut graph = Self::new();
        for provider in roots {
            graph.add(provider);
        }
        graph
    }

    /// Add a provider and all of its transitive dependencies.
    ///
    /// The first provider seen for a token is the one kept for registration;
    /// dependency edges declared by later duplicates are merged in.
    pub fn add(&mut self, provider: &ContainerProvider) {
        let token = provider.token().clone();
        if !self.providers.contains_key(&token) {
            self.providers.insert(token.clone(), provider.clone());
        }

        let deps: Vec<Token> = provider
            .dependencies()
            .iter()
            .map(|d| d.token().clone())
            .collect();
        self.insert(token, deps);

        for dep in provider.dependencies() {
            self.add(dep);
        }
    }

    /// Insert raw edges without a provider.
    pub fn insert(&mut self, token: Token, deps: impl IntoIterator<Item = Token>) {
        let edges = self.edges.entry(token).or_default();
        for dep in deps {
            if !edges.contains(&dep) {
                edges.push(dep);
            }
        }
    }

    /// Tokens in first-seen order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.edges.keys()
    }

    /// Direct dependencies of `token`.
    pub fn dependencies(&self, token: &Token) -> &[Token] {
        self.edges.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Provider registered for `token`.
    pub fn provider(&self, token: &Token) -> Option<&ContainerProvider> {
        self.providers.get(token)
    }

    /// Providers in first-seen order.
    pub fn providers(&self) -> impl Iterator<Item = &ContainerProvider> {
        self.providers.values()
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.edges.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Verify the graph is acyclic.
    ///
    /// Depth-first walk with unvisited / in-progress / done marking. The
    /// first token revisited while in progress is reported.
    pub fn check_cycles(&self) -> Result<(), LifecycleError> {
        let mut marks: HashMap<&Token, Mark> = HashMap::with_capacity(self.edges.len());
        for token in self.edges.keys() {
            self.visit(token, &mut marks)?;
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        token: &'a Token,
        marks: &mut HashMap<&'a Token, Mark>,
    ) -> Result<(), LifecycleError> {
        match marks.get(token) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                return Err(LifecycleError::CircularDependency {
                    token: token.to_string(),
                });
            }
            None => {}
        }

        marks.insert(token, Mark::InProgress);
        for dep in self.dependencies(token) {
            self.visit(dep, marks)?;
        }
        marks.insert(token, Mark::Done);
        Ok(())
    }

    /// Inverted graph: token -> tokens that depend on it.
    ///
    /// Every node appears as a key, including dependencies that were only
    /// referenced and never declared on their own.
    pub fn dependents(&self) -> IndexMap<Token, Vec<Token>> {
        let mut dependents: IndexMap<Token, Vec<Token>> = self
            .edges
            .keys()
            .map(|t| (t.clone(), Vec::new()))
            .collect();

        for (token, deps) in &self.edges {
            for dep in deps {
                let entry = dependents.entry(dep.clone()).or_default();
                if !entry.contains(token) {
                    entry.push(token.clone());
                }
            }
        }
        dependents
    }
}
