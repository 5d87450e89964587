//! In-memory account directory that records every call.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use cfsync_core::directory::{AccountDirectory, DirectoryError, DirectoryResult};
use cfsync_core::model::{
    Account, CreateTeam, CreateUser, CreatedTeam, CurrentUser, Rule, Team, TeamKind, User,
};
use cfsync_core::rules::CanonicalRule;
use cfsync_core::workflow::{Confirm, Prompt};
use cfsync_core::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CurrentUser,
    Teams,
    Users(String),
    CreateTeam(CreateTeam),
    AddUser(String, CreateUser),
    SetAdmin(String, String),
    Rules,
    CreateRules(Vec<CanonicalRule>),
}

pub struct FakeDirectory {
    account: Account,
    users: Vec<User>,
    teams: Vec<Team>,
    rules: Vec<Rule>,
    /// Keys (emails, team names, admin ids, or "rules") whose mutation fails.
    rejected: HashSet<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeDirectory {
    pub fn new(account_id: &str, account_name: &str) -> Self {
        Self {
            account: Account {
                id: account_id.into(),
                name: account_name.into(),
                admins: Vec::new(),
            },
            users: Vec::new(),
            teams: Vec::new(),
            rules: Vec::new(),
            rejected: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_users(mut self, users: &[(&str, &str)]) -> Self {
        self.users = users.iter().map(|(id, email)| user(id, email)).collect();
        self
    }

    pub fn with_admins(mut self, admins: &[&str]) -> Self {
        self.account.admins = admins.iter().map(|id| (*id).to_string()).collect();
        self
    }

    pub fn with_teams(mut self, teams: Vec<Team>) -> Self {
        self.teams = teams;
        self
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn rejecting(mut self, key: &str) -> Self {
        self.rejected.insert(key.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Calls other than reads.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    Call::CreateTeam(_) | Call::AddUser(..) | Call::SetAdmin(..) | Call::CreateRules(_)
                )
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn check(&self, key: &str) -> DirectoryResult<()> {
        if self.rejected.contains(key) {
            Err(DirectoryError::Status {
                status: 400,
                body: format!("\"{key} rejected\""),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AccountDirectory for FakeDirectory {
    async fn current_user(&self) -> DirectoryResult<CurrentUser> {
        self.record(Call::CurrentUser);
        Ok(CurrentUser {
            id: "me".into(),
            user_name: "me".into(),
            email: "me@x.com".into(),
            account: vec![self.account.clone()],
            active_account_name: self.account.name.clone(),
        })
    }

    async fn teams(&self) -> DirectoryResult<Vec<Team>> {
        self.record(Call::Teams);
        Ok(self.teams.clone())
    }

    async fn users(&self, account_id: &str) -> DirectoryResult<Vec<User>> {
        self.record(Call::Users(account_id.into()));
        Ok(self.users.clone())
    }

    async fn create_team(&self, team: &CreateTeam) -> DirectoryResult<CreatedTeam> {
        self.record(Call::CreateTeam(team.clone()));
        self.check(&team.name)?;
        let known: HashSet<&str> = self.users.iter().map(|u| u.id.as_str()).collect();
        if let Some(unknown) = team.users.iter().find(|id| !known.contains(id.as_str())) {
            return Err(DirectoryError::Status {
                status: 400,
                body: format!("\"unknown user {unknown}\""),
            });
        }
        Ok(CreatedTeam {
            id: format!("new-{}", team.name),
            name: team.name.clone(),
            tags: team.tags.clone(),
            users: team.users.clone(),
        })
    }

    async fn add_user(&self, account_id: &str, user: &CreateUser) -> DirectoryResult<User> {
        self.record(Call::AddUser(account_id.into(), user.clone()));
        self.check(&user.user_details)?;
        Ok(self::user(&format!("new-{}", user.user_details), &user.user_details))
    }

    async fn set_user_as_admin(
        &self,
        account_id: &str,
        user_id: &str,
    ) -> DirectoryResult<serde_json::Value> {
        self.record(Call::SetAdmin(account_id.into(), user_id.into()));
        self.check(user_id)?;
        Ok(serde_json::Value::Null)
    }

    async fn rules(&self) -> DirectoryResult<Vec<Rule>> {
        self.record(Call::Rules);
        Ok(self.rules.clone())
    }

    async fn create_rules(&self, rules: &[CanonicalRule]) -> DirectoryResult<serde_json::Value> {
        self.record(Call::CreateRules(rules.to_vec()));
        self.check("rules")?;
        Ok(serde_json::json!({"created": rules.len()}))
    }
}

/// Answers every prompt with a fixed value and remembers the prompts.
pub struct ScriptedConfirm {
    answer: bool,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedConfirm {
    pub fn yes() -> Self {
        Self {
            answer: true,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn no() -> Self {
        Self {
            answer: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, prompt: &Prompt) -> Result<bool> {
        self.prompts.lock().expect("prompts lock").push(prompt.clone());
        Ok(self.answer)
    }
}

pub fn user(id: &str, email: &str) -> User {
    User {
        id: id.into(),
        user_name: email.split('@').next().unwrap_or_default().into(),
        email: email.into(),
        account: Vec::new(),
    }
}

pub fn team(id: &str, name: &str, kind: Option<TeamKind>, members: Vec<User>) -> Team {
    Team {
        id: id.into(),
        name: name.into(),
        tags: Vec::new(),
        users: members,
        kind,
    }
}

/// Default and admin teams plus the given ordinary team names.
pub fn standard_teams(prefix: &str, ordinary: &[&str]) -> Vec<Team> {
    let mut teams = vec![
        team(&format!("{prefix}-default"), "users", Some(TeamKind::Default), Vec::new()),
        team(&format!("{prefix}-admin"), "admins", Some(TeamKind::Admin), Vec::new()),
    ];
    teams.extend(
        ordinary
            .iter()
            .map(|name| team(&format!("{prefix}-{name}"), name, None, Vec::new())),
    );
    teams
}

pub fn rule(id: &str, action: &str, role: &str) -> Rule {
    Rule {
        id: id.into(),
        action: action.into(),
        resource: "pipeline".into(),
        related_resource: None,
        attributes: vec!["prod".into()],
        condition: None,
        role: role.into(),
    }
}
