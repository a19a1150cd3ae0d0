//! Host symbols the patches are aimed at.
//!
//! Names are fixed by the host framework; alternatives cover builds that
//! renamed the class.

/// Service-side IME support class, newest name first.
pub const PRIMARY_CLASS_CANDIDATES: &[&str] = &[
    "android.inputmethodservice.InputMethodServiceInjector",
    "android.inputmethodservice.InputMethodServiceStubImpl",
];

pub const IME_SUPPORT_FIELD: &str = "sIsImeSupport";
pub const VOICE_INPUT_CHECK: &str = "isXiaoAiEnable";

pub const PHONE_WINDOW_CLASS: &str = "com.android.internal.policy.PhoneWindow";
pub const SET_NAV_BAR_COLOR: &str = "setNavigationBarColor";
pub const ADD_BOTTOM_VIEW: &str = "addMiuiBottomView";
pub const CUSTOMIZE_BOTTOM_VIEW_COLOR: &str = "customizeBottomViewColor";

pub const DELETE_NOT_SUPPORT_IME: &str = "deleteNotSupportIme";
pub const INJECTOR_SWITCH_LISTENER: &str =
    "android.inputmethodservice.InputMethodServiceInjector$MiuiSwitchInputMethodListener";
pub const BOTTOM_MANAGER_SWITCH_LISTENER: &str =
    "com.miui.inputmethod.InputMethodBottomManager$MiuiSwitchInputMethodListener";

pub const MODULE_MANAGER_CLASS: &str = "android.inputmethodservice.InputMethodModuleManager";
pub const LOAD_DEX: &str = "loadDex";
pub const LOAD_DEX_PARAMS: &[&str] = &["java.lang.ClassLoader", "java.lang.String"];

pub const BOTTOM_MANAGER_CLASS: &str = "com.miui.inputmethod.InputMethodBottomManager";
pub const GET_SUPPORT_IME: &str = "getSupportIme";
pub const BOTTOM_VIEW_HELPER_FIELD: &str = "sBottomViewHelper";
pub const IMM_FIELD: &str = "mImm";
pub const ENABLED_IME_LIST: &str = "getEnabledInputMethodList";
