pub trait ParameterStore {
    fn decrypted_parameter(&self, name: &str) -> Result<String, String>;
}
