//! Route table and session guard

/// The three views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Feed,
    Profile,
    Login,
}

impl Route {
    pub fn parse(path: &str) -> Option<Self> {
        match path.trim().trim_end_matches('/') {
            "" => Some(Self::Feed),
            "/profile" => Some(Self::Profile),
            "/login" => Some(Self::Login),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Feed => "/",
            Self::Profile => "/profile",
            Self::Login => "/login",
        }
    }

    pub fn requires_session(&self) -> bool {
        !matches!(self, Self::Login)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(Route),
}

/// One routing step for `path`
pub fn resolve(path: &str, authenticated: bool) -> Resolution {
    match Route::parse(path) {
        None => Resolution::Redirect(Route::Feed),
        Some(route) if route.requires_session() && !authenticated => {
            Resolution::Redirect(Route::Login)
        }
        Some(Route::Login) if authenticated => Resolution::Redirect(Route::Feed),
        Some(route) => Resolution::Render(route),
    }
}

/// Follow redirects until a view renders
pub fn navigate(path: &str, authenticated: bool) -> Route {
    let mut current = path.to_string();
    // Longest chain: unknown -> feed -> login
    for _ in 0..3 {
        match resolve(&current, authenticated) {
            Resolution::Render(route) => return route,
            Resolution::Redirect(next) => current = next.path().to_string(),
        }
    }
    if authenticated {
        Route::Feed
    } else {
        Route::Login
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Go(Route),
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub action: NavAction,
}

/// Navigation bar entries for the current session state
pub fn nav_items(authenticated: bool) -> Vec<NavItem> {
    if authenticated {
        vec![
            NavItem {
                label: "Home",
                action: NavAction::Go(Route::Feed),
            },
            NavItem {
                label: "Profile",
                action: NavAction::Go(Route::Profile),
            },
            NavItem {
                label: "Logout",
                action: NavAction::Logout,
            },
        ]
    } else {
        vec![NavItem {
            label: "Login",
            action: NavAction::Go(Route::Login),
        }]
    }
}
