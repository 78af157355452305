use serde::{Deserialize, Serialize};

/// The party a dataset is scoped and searched for.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Actor {
	pub id: String,
	pub roles: Vec<String>,
	/// Bypasses scope filtering entirely.
	pub unrestricted: bool,
	/// Home records scoping starts from. While scoping is enabled, an actor without roots
	/// sees nothing.
	pub scope_roots: Vec<String>,
}
impl Actor {
	pub fn new(id: impl Into<String>) -> Self {
		Self { id: id.into(), ..Default::default() }
	}

	pub fn with_roles<I, S>(mut self, roles: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.roles = roles.into_iter().map(Into::into).collect();

		self
	}

	pub fn scoped_to<I, S>(mut self, roots: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope_roots = roots.into_iter().map(Into::into).collect();

		self
	}

	pub fn into_unrestricted(mut self) -> Self {
		self.unrestricted = true;

		self
	}

	pub fn has_any_role(&self, allowed: &[String]) -> bool {
		self.roles.iter().any(|role| allowed.contains(role))
	}
}
